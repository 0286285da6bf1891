//! Utility functions for image conversion, output and numeric casting.

pub mod safe_cast;
pub mod image_conversion;

pub use image_conversion::OutputWriter;
