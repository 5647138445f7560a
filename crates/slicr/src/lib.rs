#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use slicr_image as image;

#[doc(inline)]
pub use slicr_imgproc as imgproc;
