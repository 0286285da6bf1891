//! Classical face classification and detection.
//!
//! This library provides:
//! - PCA ("eigenfaces") over flattened face images
//! - A generic AdaBoost ensemble over raw pixel features
//! - The Viola-Jones detector: Haar-like features scored on integral images,
//!   selected by a boosting loop and scanned over an image with a sliding window
//!
//! The Viola-Jones pipeline consists of:
//! 1. Integral images of 24x24 positive and negative training images
//! 2. A bank of Haar features enumerated inside the 24x24 window
//! 3. A score matrix of every feature on every training image
//! 4. Boosting rounds, each selecting one decision stump over a score column
//! 5. Sliding-window detection averaged into a single face box
//!
//! # Examples
//!
//! ## Training on synthetic images
//!
//! ```
//! use face_classifier::haar::{FeatureBank, FeatureType, HaarFeature};
//! use face_classifier::viola_jones::ViolaJones;
//! use ndarray::Array2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let faces = vec![Array2::from_elem((24, 24), 200.0); 2];
//! let background = vec![Array2::from_elem((24, 24), 50.0); 2];
//!
//! // Restrict the vocabulary to one feature
//! let feature = HaarFeature::new(FeatureType::ThreeHorizontal, (0, 0), (6, 4));
//! let bank = FeatureBank::from_features(24, vec![feature])?;
//!
//! let mut vj = ViolaJones::new(&faces, &background)?.with_feature_bank(bank);
//! vj.train(1)?;
//!
//! assert_eq!(vj.predict(&faces)?, vec![1.0, 1.0]);
//! assert_eq!(vj.evaluate()?, (4, 0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Generic boosting
//!
//! ```
//! use face_classifier::boosting::Boosting;
//! use ndarray::array;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let x = array![[10.0, 0.0], [12.0, 1.0], [1.0, 0.0], [2.0, 1.0]];
//! let y = array![1.0, 1.0, -1.0, -1.0];
//!
//! let mut boost = Boosting::new(x.clone(), y, 5)?;
//! boost.train()?;
//! let predictions = boost.predict(x.view())?;
//! assert_eq!(predictions.to_vec(), vec![1.0, 1.0, -1.0, -1.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Face detection
//!
//! ```no_run
//! use face_classifier::dataset::load_gray_images;
//! use face_classifier::utils::OutputWriter;
//! use face_classifier::viola_jones::ViolaJones;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pos = load_gray_images("data/pos", "png", Some((24, 24)))?;
//! let neg = load_gray_images("data/neg", "png", Some((24, 24)))?;
//!
//! let mut vj = ViolaJones::new(&pos, &neg)?;
//! vj.create_haar_features();
//! vj.train(5)?;
//!
//! let image = image::open("data/man.jpeg")?;
//! match vj.face_detection(&image, &OutputWriter::default(), "detection")? {
//!     Some(face) => println!("Face from {:?} to {:?}", face.top_left, face.bottom_right),
//!     None => println!("No face found"),
//! }
//! # Ok(())
//! # }
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

/// Summed-area tables
pub mod integral_image;

/// Haar-like features and the feature bank
pub mod haar;

/// Weak classifiers and learner strategies
pub mod classifiers;

/// Ensemble and per-round helpers shared by the boosting engines
pub mod training;

/// Generic AdaBoost engine
pub mod boosting;

/// Viola-Jones trainer and detector
pub mod viola_jones;

/// Sliding-window helpers and box aggregation
pub mod detection;

/// Principal component analysis
pub mod pca;

/// Dataset loading and splitting
pub mod dataset;

/// Utility functions for image conversion and safe casting
pub mod utils;

pub use error::{Error, Result};
