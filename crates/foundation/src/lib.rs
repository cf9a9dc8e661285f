//! Geodesy, local frames and handle primitives shared by the overlay crates.

pub mod handles;
pub mod math;
pub mod time;

pub use handles::*;
pub use math::GeoPoint;
pub use time::*;
