pub mod error_code;
pub mod geometry;
pub mod platform;
pub mod quote;

pub use error_code::*;
pub use geometry::*;
pub use platform::*;
pub use quote::*;
