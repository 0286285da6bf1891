//! Sliding-window scan helpers and the mean-box heuristic.

use crate::utils::safe_cast::{f64_to_i64, i64_to_u32_clamp};
use crate::{Error, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use ndarray::{s, Array2, ArrayView2};

const CANVAS_LIMIT: i64 = 1 << 20;

/// Top-left corner of a detector window, in image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPosition {
    /// Column of the left edge
    pub x: usize,
    /// Row of the top edge
    pub y: usize,
}

/// Every window start inside a `height` x `width` image, row by row
///
/// Rows run over `0..height - window` and columns over `0..width - window`,
/// so a window never touches the last row or column band. Images no larger
/// than the window yield nothing.
#[must_use]
pub fn window_positions(height: usize, width: usize, window: usize) -> Vec<WindowPosition> {
    let rows = height.saturating_sub(window);
    let cols = width.saturating_sub(window);
    (0..rows)
        .flat_map(|y| (0..cols).map(move |x| WindowPosition { x, y }))
        .collect()
}

/// Borrow the `window` x `window` sub-image at `position`
///
/// # Errors
///
/// Returns `InvalidInput` if the window does not fit inside the image
pub fn extract_window<'a>(image: &'a Array2<f64>, position: WindowPosition, window: usize) -> Result<ArrayView2<'a, f64>> {
    let (height, width) = image.dim();
    if position.y + window > height || position.x + window > width {
        return Err(Error::InvalidInput(format!(
            "{window}x{window} window at ({}, {}) exceeds {height}x{width} image",
            position.x, position.y
        )));
    }
    Ok(image.slice(s![position.y..position.y + window, position.x..position.x + window]))
}

/// Averaged face bounding box, corners as `(x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceBox {
    /// Top-left corner
    pub top_left: (i64, i64),
    /// Bottom-right corner
    pub bottom_right: (i64, i64),
    /// Number of positive windows averaged into the box
    pub windows: usize,
}

impl FaceBox {
    /// Box width in pixels (may be zero or negative after the offset)
    #[must_use]
    pub const fn width(&self) -> i64 {
        self.bottom_right.0 - self.top_left.0
    }

    /// Box height in pixels
    #[must_use]
    pub const fn height(&self) -> i64 {
        self.bottom_right.1 - self.top_left.1
    }
}

/// Average the corners of all positive windows into one box
///
/// Each corner is the mean of the windows' corners truncated toward zero and
/// shifted by `offset`. Returns `None` when there are no windows.
///
/// # Errors
///
/// Returns `InvalidInput` if a mean coordinate cannot be represented
#[allow(clippy::cast_precision_loss)]
pub fn mean_box(positives: &[WindowPosition], window: usize, offset: (i64, i64)) -> Result<Option<FaceBox>> {
    if positives.is_empty() {
        return Ok(None);
    }

    let count = positives.len() as f64;
    let mean = |coordinate: &dyn Fn(&WindowPosition) -> usize| {
        f64_to_i64(positives.iter().map(|p| coordinate(p) as f64).sum::<f64>() / count)
    };
    let (left, top) = (mean(&|p: &WindowPosition| p.x)?, mean(&|p: &WindowPosition| p.y)?);
    let (right, bottom) = (
        mean(&|p: &WindowPosition| p.x + window)?,
        mean(&|p: &WindowPosition| p.y + window)?,
    );

    Ok(Some(FaceBox {
        top_left: (left + offset.0, top + offset.1),
        bottom_right: (right + offset.0, bottom + offset.1),
        windows: positives.len(),
    }))
}

/// Draw the outline of `face` onto `image`, `thickness` pixels wide inward
///
/// Parts of the outline outside the image are clipped. Degenerate boxes draw
/// nothing.
#[allow(clippy::cast_possible_truncation)]
pub fn draw_box(image: &mut RgbImage, face: &FaceBox, color: [u8; 3], thickness: u32) {
    // Corner arithmetic stays inside i32
    let limit = |v: i64| v.clamp(-CANVAS_LIMIT, CANVAS_LIMIT) as i32;

    for inset in 0..i64::from(thickness) {
        let width = face.width() - 2 * inset;
        let height = face.height() - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(limit(face.top_left.0 + inset), limit(face.top_left.1 + inset)).of_size(
            i64_to_u32_clamp(width, CANVAS_LIMIT as u32),
            i64_to_u32_clamp(height, CANVAS_LIMIT as u32),
        );
        draw_hollow_rect_mut(image, rect, Rgb(color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_positions_exclusive_end() {
        let positions = window_positions(26, 27, 24);
        // Rows 0..2, columns 0..3
        assert_eq!(positions.len(), 6);
        assert_eq!(positions[0], WindowPosition { x: 0, y: 0 });
        assert_eq!(positions[1], WindowPosition { x: 1, y: 0 });
        assert_eq!(positions[5], WindowPosition { x: 2, y: 1 });

        assert!(window_positions(24, 24, 24).is_empty());
        assert!(window_positions(10, 40, 24).is_empty());
    }

    #[test]
    fn test_extract_window() {
        let image = Array2::from_shape_fn((30, 30), |(r, c)| (r * 100 + c) as f64);
        let view = extract_window(&image, WindowPosition { x: 2, y: 5 }, 24).unwrap();
        assert_eq!(view.dim(), (24, 24));
        assert_eq!(view[[0, 0]], 502.0);

        assert!(extract_window(&image, WindowPosition { x: 7, y: 0 }, 24).is_err());
    }

    #[test]
    fn test_mean_box() {
        let positives = [WindowPosition { x: 10, y: 20 }, WindowPosition { x: 13, y: 21 }];
        let face = mean_box(&positives, 24, (3, -3)).unwrap().unwrap();
        // Means 11.5 -> 11 and 20.5 -> 20, ends 35.5 -> 35 and 44.5 -> 44
        assert_eq!(face.top_left, (14, 17));
        assert_eq!(face.bottom_right, (38, 41));
        assert_eq!(face.windows, 2);
        assert_eq!(face.width(), 24);
    }

    #[test]
    fn test_mean_box_empty() {
        assert_eq!(mean_box(&[], 24, (3, -3)).unwrap(), None);
    }

    #[test]
    fn test_draw_box() {
        let mut image = RgbImage::new(40, 40);
        let face = FaceBox {
            top_left: (5, 5),
            bottom_right: (20, 20),
            windows: 1,
        };
        draw_box(&mut image, &face, [255, 0, 0], 2);

        assert_eq!(image.get_pixel(5, 5).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(6, 10).0, [255, 0, 0]);
        assert_eq!(image.get_pixel(7, 10).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(12, 12).0, [0, 0, 0]);
    }

    #[test]
    fn test_draw_box_clips() {
        let mut image = RgbImage::new(10, 10);
        let face = FaceBox {
            top_left: (-5, 4),
            bottom_right: (30, 30),
            windows: 1,
        };
        draw_box(&mut image, &face, [0, 255, 0], 1);
        assert_eq!(image.get_pixel(0, 4).0, [0, 255, 0]);
        assert_eq!(image.get_pixel(5, 5).0, [0, 0, 0]);
    }
}
