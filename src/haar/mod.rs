//! Haar-like rectangle features.
//!
//! A feature is a pure descriptor: a shape, a top-left `(row, col)` position
//! and a `(height, width)` footprint. It owns no pixels and is evaluated
//! against externally supplied integral images.
//!
//! Bands are split with integer division; any remainder rows or columns belong
//! to the last band. Bright bands add to the score and dark bands subtract.
//!
//! ```text
//! (2, 1)     (1, 2)     (3, 1)     (1, 3)        (2, 2)
//! +-----+    +--+--+    +-----+    +--+--+--+    +--+--+
//! |  B  |    |B |D |    |  B  |    |B |D |B |    |D |B |
//! +-----+    |  |  |    +-----+    |  |  |  |    +--+--+
//! |  D  |    |  |  |    |  D  |    |  |  |  |    |B |D |
//! +-----+    +--+--+    +-----+    +--+--+--+    +--+--+
//!                       |  B  |
//!                       +-----+
//! ```

/// Feature bank enumeration and score matrix computation
pub mod bank;

use crate::constants::{BRIGHT_INTENSITY, DARK_INTENSITY};
use crate::integral_image::IntegralImage;
use crate::utils::image_conversion::u8_array_to_gray_image;
use crate::utils::OutputWriter;
use crate::{Error, Result};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use bank::{score_matrix, FeatureBank};

/// The five Haar feature shapes, tagged by `(vertical bands, horizontal bands)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureType {
    /// `(2, 1)`: bright top half, dark bottom half
    TwoHorizontal,
    /// `(1, 2)`: bright left half, dark right half
    TwoVertical,
    /// `(3, 1)`: bright, dark, bright thirds from top to bottom
    ThreeHorizontal,
    /// `(1, 3)`: bright, dark, bright thirds from left to right
    ThreeVertical,
    /// `(2, 2)`: checkerboard with dark top-left and bottom-right quadrants
    FourSquare,
}

impl FeatureType {
    /// All feature types, in feature-bank enumeration order
    pub const ALL: [FeatureType; 5] = [
        FeatureType::TwoHorizontal,
        FeatureType::TwoVertical,
        FeatureType::ThreeHorizontal,
        FeatureType::ThreeVertical,
        FeatureType::FourSquare,
    ];

    /// Band counts `(rows, columns)`; identical to the feature's type tag
    #[must_use]
    pub const fn bands(self) -> (usize, usize) {
        match self {
            FeatureType::TwoHorizontal => (2, 1),
            FeatureType::TwoVertical => (1, 2),
            FeatureType::ThreeHorizontal => (3, 1),
            FeatureType::ThreeVertical => (1, 3),
            FeatureType::FourSquare => (2, 2),
        }
    }

    /// Snake-case name of the shape
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            FeatureType::TwoHorizontal => "two_horizontal",
            FeatureType::TwoVertical => "two_vertical",
            FeatureType::ThreeHorizontal => "three_horizontal",
            FeatureType::ThreeVertical => "three_vertical",
            FeatureType::FourSquare => "four_square",
        }
    }
}

impl TryFrom<(usize, usize)> for FeatureType {
    type Error = Error;

    fn try_from(tag: (usize, usize)) -> Result<Self> {
        match tag {
            (2, 1) => Ok(FeatureType::TwoHorizontal),
            (1, 2) => Ok(FeatureType::TwoVertical),
            (3, 1) => Ok(FeatureType::ThreeHorizontal),
            (1, 3) => Ok(FeatureType::ThreeVertical),
            (2, 2) => Ok(FeatureType::FourSquare),
            (rows, cols) => Err(Error::InvalidFeatureType(rows, cols)),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, cols) = self.bands();
        write!(f, "({rows}, {cols})")
    }
}

/// A Haar-like feature anchored inside a detection window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HaarFeature {
    feat_type: FeatureType,
    position: (usize, usize),
    size: (usize, usize),
}

impl HaarFeature {
    /// Create a feature with top-left `position = (row, col)` and `size = (height, width)`
    #[must_use]
    pub const fn new(feat_type: FeatureType, position: (usize, usize), size: (usize, usize)) -> Self {
        Self {
            feat_type,
            position,
            size,
        }
    }

    /// Create a feature from a raw `(rows, cols)` type tag
    ///
    /// # Errors
    ///
    /// Returns `InvalidFeatureType` if the tag is not one of the five shapes
    pub fn from_tag(tag: (usize, usize), position: (usize, usize), size: (usize, usize)) -> Result<Self> {
        Ok(Self::new(FeatureType::try_from(tag)?, position, size))
    }

    /// Shape of the feature
    #[must_use]
    pub const fn feat_type(&self) -> FeatureType {
        self.feat_type
    }

    /// Top-left corner as `(row, col)`
    #[must_use]
    pub const fn position(&self) -> (usize, usize) {
        self.position
    }

    /// Footprint as `(height, width)`
    #[must_use]
    pub const fn size(&self) -> (usize, usize) {
        self.size
    }

    /// Whether the footprint lies inside an image of the given size
    #[must_use]
    pub const fn fits(&self, height: usize, width: usize) -> bool {
        self.position.0 + self.size.0 <= height && self.position.1 + self.size.1 <= width
    }

    /// Draw the feature on a zero grid of `shape = (rows, cols)`
    ///
    /// Bright bands are 255 and dark bands 126. Bands falling outside the grid
    /// are clipped.
    #[must_use]
    pub fn render(&self, shape: (usize, usize)) -> Array2<u8> {
        let mut out = Array2::<u8>::zeros(shape);
        let (r, c) = self.position;
        let (h, w) = self.size;

        let mut fill = |rows: (usize, usize), cols: (usize, usize), value: u8| {
            let (rows_end, cols_end) = (rows.1.min(shape.0), cols.1.min(shape.1));
            if rows.0 < rows_end && cols.0 < cols_end {
                out.slice_mut(s![rows.0..rows_end, cols.0..cols_end]).fill(value);
            }
        };

        match self.feat_type {
            FeatureType::TwoHorizontal => {
                let sh = h / 2;
                fill((r, r + sh), (c, c + w), BRIGHT_INTENSITY);
                fill((r + sh, r + h), (c, c + w), DARK_INTENSITY);
            }
            FeatureType::TwoVertical => {
                let sw = w / 2;
                fill((r, r + h), (c, c + sw), BRIGHT_INTENSITY);
                fill((r, r + h), (c + sw, c + w), DARK_INTENSITY);
            }
            FeatureType::ThreeHorizontal => {
                let sh = h / 3;
                fill((r, r + sh), (c, c + w), BRIGHT_INTENSITY);
                fill((r + sh, r + 2 * sh), (c, c + w), DARK_INTENSITY);
                fill((r + 2 * sh, r + h), (c, c + w), BRIGHT_INTENSITY);
            }
            FeatureType::ThreeVertical => {
                let sw = w / 3;
                fill((r, r + h), (c, c + sw), BRIGHT_INTENSITY);
                fill((r, r + h), (c + sw, c + 2 * sw), DARK_INTENSITY);
                fill((r, r + h), (c + 2 * sw, c + w), BRIGHT_INTENSITY);
            }
            FeatureType::FourSquare => {
                let (sh, sw) = (h / 2, w / 2);
                fill((r, r + sh), (c, c + sw), DARK_INTENSITY);
                fill((r, r + sh), (c + sw, c + w), BRIGHT_INTENSITY);
                fill((r + sh, r + h), (c, c + sw), BRIGHT_INTENSITY);
                fill((r + sh, r + h), (c + sw, c + w), DARK_INTENSITY);
            }
        }

        out
    }

    /// Render the feature and persist it through `writer`
    ///
    /// Without a file name the image is written as `"<feat_type>_feature"`,
    /// e.g. `(2, 1)_feature.png`.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be written
    pub fn preview(&self, shape: (usize, usize), writer: &OutputWriter, filename: Option<&str>) -> Result<Array2<u8>> {
        let grid = self.render(shape);
        let name = filename.map_or_else(|| format!("{}_feature", self.feat_type), str::to_string);
        writer.write_gray(&u8_array_to_gray_image(&grid)?, &name)?;
        Ok(grid)
    }

    /// Score of the feature on an integral image: bright area sum minus dark area sum
    ///
    /// Every band is a four-lookup rectangle sum. The footprint must lie inside
    /// the integral image (see [`HaarFeature::fits`]).
    #[must_use]
    pub fn evaluate(&self, ii: &IntegralImage) -> f64 {
        self.evaluate_at(ii, (0, 0))
    }

    /// Score of the feature inside the window whose top-left corner is
    /// `origin = (row, col)` of a larger integral image
    ///
    /// Equal to [`HaarFeature::evaluate`] on the integral image of that window
    /// alone. The shifted footprint must lie inside `ii`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn evaluate_at(&self, ii: &IntegralImage, origin: (usize, usize)) -> f64 {
        let (r, c) = (self.position.0 + origin.0, self.position.1 + origin.1);
        let (h, w) = self.size;

        // Sum of a `height` x `width` block whose top-left corner is (top, left).
        let block = |top: usize, left: usize, height: usize, width: usize| {
            ii.rect_sum(
                top as isize,
                left as isize,
                (top + height) as isize - 1,
                (left + width) as isize - 1,
            )
        };

        match self.feat_type {
            FeatureType::TwoHorizontal => {
                let sh = h / 2;
                block(r, c, sh, w) - block(r + sh, c, h - sh, w)
            }
            FeatureType::TwoVertical => {
                let sw = w / 2;
                block(r, c, h, sw) - block(r, c + sw, h, w - sw)
            }
            FeatureType::ThreeHorizontal => {
                let sh = h / 3;
                block(r, c, sh, w) - block(r + sh, c, sh, w) + block(r + 2 * sh, c, h - 2 * sh, w)
            }
            FeatureType::ThreeVertical => {
                let sw = w / 3;
                block(r, c, h, sw) - block(r, c + sw, h, sw) + block(r, c + 2 * sw, h, w - 2 * sw)
            }
            FeatureType::FourSquare => {
                let (sh, sw) = (h / 2, w / 2);
                let top_left = block(r, c, sh, sw);
                let top_right = block(r, c + sw, sh, w - sw);
                let bottom_left = block(r + sh, c, h - sh, sw);
                let bottom_right = block(r + sh, c + sw, h - sh, w - sw);
                top_right + bottom_left - top_left - bottom_right
            }
        }
    }
}

impl fmt::Display for HaarFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} at ({}, {}) size {}x{}",
            self.feat_type.name(),
            self.feat_type,
            self.position.0,
            self.position.1,
            self.size.0,
            self.size.1
        )
    }
}
