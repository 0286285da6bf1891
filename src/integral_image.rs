//! Summed-area tables for O(1) rectangle sums.
//!
//! `ii[r][c]` holds the sum of every pixel at row `<= r` and column `<= c`.
//! The table is stored with an extra leading zero row and column so that the
//! "everything strictly before row r / column c" lookups used by Haar features
//! (`r - 1`, `c - 1`) are valid at the image border and read as zero.

use crate::utils::image_conversion::gray_image_to_array;
use crate::{Error, Result};
use image::GrayImage;
use ndarray::{s, Array2, ArrayView2};

/// Integral image of a single grayscale image
#[derive(Debug, Clone, PartialEq)]
pub struct IntegralImage {
    // (height + 1) x (width + 1), first row and column are zero.
    table: Array2<f64>,
}

impl IntegralImage {
    /// Build the integral image of a grayscale intensity grid
    #[must_use]
    pub fn new(image: &Array2<f64>) -> Self {
        Self::from_view(image.view())
    }

    /// Build the integral image of a borrowed grid, e.g. a detection window
    #[must_use]
    pub fn from_view(image: ArrayView2<'_, f64>) -> Self {
        let (height, width) = image.dim();
        let mut table = Array2::<f64>::zeros((height + 1, width + 1));

        for row in 0..height {
            let mut row_sum = 0.0;
            for col in 0..width {
                row_sum += image[[row, col]];
                table[[row + 1, col + 1]] = table[[row, col + 1]] + row_sum;
            }
        }

        Self { table }
    }

    /// Build the integral image of an 8-bit grayscale image
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self::new(&gray_image_to_array(image))
    }

    /// Height of the source image
    #[must_use]
    pub fn height(&self) -> usize {
        self.table.nrows() - 1
    }

    /// Width of the source image
    #[must_use]
    pub fn width(&self) -> usize {
        self.table.ncols() - 1
    }

    /// `(height, width)` of the source image
    #[must_use]
    pub fn dim(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Cumulative sum at `(row, col)`; `-1` in either coordinate reads the zero border
    ///
    /// # Panics
    ///
    /// Panics if a coordinate is below `-1` or past the image
    #[must_use]
    #[inline]
    #[allow(clippy::cast_sign_loss)]
    pub fn at(&self, row: isize, col: isize) -> f64 {
        debug_assert!(row >= -1 && col >= -1, "integral image lookup at ({row}, {col})");
        self.table[[(row + 1) as usize, (col + 1) as usize]]
    }

    /// Sum of the pixels in rows `top..=bottom` and columns `left..=right`
    ///
    /// An empty range (`bottom == top - 1` or `right == left - 1`) sums to zero.
    #[must_use]
    #[inline]
    pub fn rect_sum(&self, top: isize, left: isize, bottom: isize, right: isize) -> f64 {
        self.at(bottom, right) - self.at(bottom, left - 1) - self.at(top - 1, right)
            + self.at(top - 1, left - 1)
    }

    /// Sum of every pixel of the source image
    #[must_use]
    pub fn total(&self) -> f64 {
        self.table[[self.height(), self.width()]]
    }

    /// The table without its zero border, same shape as the source image
    #[must_use]
    pub fn to_array(&self) -> Array2<f64> {
        self.table.slice(s![1.., 1..]).to_owned()
    }
}

/// Convert a batch of grayscale images to integral images, preserving order
///
/// # Errors
///
/// Returns `ShapeMismatch` before any table is built if the images do not all
/// share the dimensions of the first one
pub fn integral_images(images: &[Array2<f64>]) -> Result<Vec<IntegralImage>> {
    ensure_uniform_shape(images)?;
    Ok(images.iter().map(IntegralImage::new).collect())
}

/// Check that every image in a batch has the same `(height, width)`
///
/// # Errors
///
/// Returns `ShapeMismatch` naming the first offending image
pub fn ensure_uniform_shape(images: &[Array2<f64>]) -> Result<()> {
    let Some(first) = images.first() else {
        return Ok(());
    };
    let expected = first.dim();

    for (index, image) in images.iter().enumerate().skip(1) {
        if image.dim() != expected {
            return Err(Error::ShapeMismatch(format!(
                "image {index} is {}x{}, expected {}x{}",
                image.nrows(),
                image.ncols(),
                expected.0,
                expected.1
            )));
        }
    }

    Ok(())
}
