mod axis;
pub use axis::Axis;

#[allow(clippy::module_inception)]
mod pixel;
pub use pixel::Pixel;

mod pixel_array;
pub use pixel_array::PixelArray;
