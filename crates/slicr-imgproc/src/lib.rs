#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// Lab edge estimation module.
pub mod edges;

/// module containing parallization utilities.
pub mod parallel;

/// superpixel segmentation module.
pub mod superpixel;
