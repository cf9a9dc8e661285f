//! Geo-anchored 3D overlay engine.
//!
//! Keeps a persistent scene graph aligned with a host map's camera: route
//! geometry is projected into a local frame around an anchor, the host's
//! per-frame transform becomes the camera, and the renderer follows the
//! host's graphics context through loss and restoration.

pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod overlay;
pub mod render_loop;
pub mod route;
pub mod tilt;
pub mod transform;

pub use config::*;
pub use error::*;
pub use host::*;
pub use lifecycle::*;
pub use overlay::*;
pub use render_loop::*;
pub use route::*;
pub use transform::*;
