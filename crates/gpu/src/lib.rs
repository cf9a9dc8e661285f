pub mod buffers;
pub mod camera;
pub mod command;
pub mod context;
pub mod renderer;

pub use camera::*;
pub use context::*;
pub use renderer::*;
