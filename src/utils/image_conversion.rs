//! Image conversion utilities for `image` buffers and ndarray grids, plus the
//! writer used to persist previews and annotated detections.

use crate::utils::safe_cast::{f64_to_u8_clamp, usize_to_u32};
use crate::{Error, Result};
use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Convert a grayscale image into an `(height, width)` grid of intensities
#[must_use]
pub fn gray_image_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(row, col)| {
        f64::from(image.get_pixel(col as u32, row as u32)[0])
    })
}

/// Convert any decoded image to grayscale and return it as a grid
#[must_use]
pub fn dynamic_to_gray_array(image: &DynamicImage) -> Array2<f64> {
    gray_image_to_array(&image.to_luma8())
}

/// Convert a grid of intensities into a grayscale image
///
/// Values are clamped into `[0, 255]` and truncated.
///
/// # Errors
///
/// Returns an error if the grid is larger than an image buffer can address
pub fn array_to_gray_image(grid: &Array2<f64>) -> Result<GrayImage> {
    let (rows, cols) = grid.dim();
    let width = usize_to_u32(cols)?;
    let height = usize_to_u32(rows)?;

    // Standard layout iterates in row-major order, matching the image buffer.
    let raw: Vec<u8> = grid.iter().map(|&value| f64_to_u8_clamp(value)).collect();

    GrayImage::from_raw(width, height, raw)
        .ok_or_else(|| Error::InvalidInput(format!("Cannot build {width}x{height} image from grid")))
}

/// Convert a grid of 8-bit intensities into a grayscale image
///
/// # Errors
///
/// Returns an error if the grid is larger than an image buffer can address
pub fn u8_array_to_gray_image(grid: &Array2<u8>) -> Result<GrayImage> {
    let (rows, cols) = grid.dim();
    let width = usize_to_u32(cols)?;
    let height = usize_to_u32(rows)?;
    let raw: Vec<u8> = grid.iter().copied().collect();

    GrayImage::from_raw(width, height, raw)
        .ok_or_else(|| Error::InvalidInput(format!("Cannot build {width}x{height} image from grid")))
}

/// Linearly stretch a grid so its minimum maps to 0 and its maximum to 255
///
/// A constant grid maps to all zeros.
#[must_use]
pub fn rescale_intensity(grid: &Array2<f64>) -> Array2<f64> {
    let min = grid.iter().copied().fold(f64::INFINITY, f64::min);
    let max = grid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range <= 0.0 {
        return Array2::zeros(grid.dim());
    }

    grid.mapv(|value| (value - min) / range * 255.0)
}

/// Persists grids and images as PNG files under a fixed output directory
#[derive(Debug, Clone)]
pub struct OutputWriter {
    directory: PathBuf,
}

impl OutputWriter {
    /// Create a writer rooted at `directory`; the directory is created lazily
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Output directory of this writer
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path a file named `name` (without extension) is written to
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{name}.png"))
    }

    /// Write a grid of intensities as `<directory>/<name>.png`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or encoding fails
    pub fn write_grid(&self, grid: &Array2<f64>, name: &str) -> Result<PathBuf> {
        let image = array_to_gray_image(grid)?;
        self.write_gray(&image, name)
    }

    /// Write a grayscale image as `<directory>/<name>.png`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or encoding fails
    pub fn write_gray(&self, image: &GrayImage, name: &str) -> Result<PathBuf> {
        let path = self.prepare(name)?;
        image.save(&path)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write an RGB image as `<directory>/<name>.png`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or encoding fails
    pub fn write_rgb(&self, image: &RgbImage, name: &str) -> Result<PathBuf> {
        let path = self.prepare(name)?;
        image.save(&path)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn prepare(&self, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.directory)?;
        Ok(self.path_for(name))
    }
}

impl Default for OutputWriter {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_OUTPUT_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use ndarray::array;

    #[test]
    fn test_gray_image_to_array_layout() {
        let mut img = GrayImage::new(3, 2);
        img.put_pixel(2, 0, Luma([7]));
        img.put_pixel(0, 1, Luma([9]));

        let grid = gray_image_to_array(&img);
        assert_eq!(grid.dim(), (2, 3));
        assert_eq!(grid[[0, 2]], 7.0);
        assert_eq!(grid[[1, 0]], 9.0);
    }

    #[test]
    fn test_array_to_gray_image_clamps() {
        let grid = array![[-5.0, 0.0, 126.0], [255.0, 300.0, 12.9]];
        let img = array_to_gray_image(&grid).unwrap();

        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
        assert_eq!(img.get_pixel(2, 0)[0], 126);
        assert_eq!(img.get_pixel(1, 1)[0], 255);
        assert_eq!(img.get_pixel(2, 1)[0], 12);
    }

    #[test]
    fn test_rescale_intensity() {
        let grid = array![[1.0, 3.0], [5.0, 2.0]];
        let scaled = rescale_intensity(&grid);
        assert_eq!(scaled[[0, 0]], 0.0);
        assert_eq!(scaled[[1, 0]], 255.0);

        let flat = Array2::from_elem((2, 2), 4.0);
        assert!(rescale_intensity(&flat).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_output_writer_path() {
        let writer = OutputWriter::new("out");
        assert_eq!(writer.path_for("(2, 1)_feature"), PathBuf::from("out/(2, 1)_feature.png"));
    }
}
