pub mod components;
pub mod object;
pub mod prefabs;
pub mod store;

pub use object::*;
pub use store::*;
