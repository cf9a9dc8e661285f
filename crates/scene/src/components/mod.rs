pub mod animation;
pub mod drawable3d;
pub mod material;
pub mod tag;
pub mod transform;

pub use animation::*;
pub use drawable3d::*;
pub use material::*;
pub use tag::*;
pub use transform::*;
