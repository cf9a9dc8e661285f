pub mod geo_point;
pub mod geodesy;
pub mod local;
pub mod mat4;
pub mod vec;

pub use geo_point::*;
pub use geodesy::*;
pub use local::*;
pub use mat4::*;
pub use vec::*;
