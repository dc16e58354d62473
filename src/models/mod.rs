pub mod image;
pub mod options;

pub use image::*;
pub use options::*;
