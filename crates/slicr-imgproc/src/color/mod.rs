mod lab;

pub use lab::{lab_from_rgb, rgb_to_lab};
