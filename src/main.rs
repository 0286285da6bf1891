//! Command line front end for eigenfaces, boosting and Viola-Jones face detection.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use face_classifier::boosting::Boosting;
use face_classifier::classifiers::{WeakClassifier, WeakLearner, WeightedMeanLearner};
use face_classifier::config::Config;
use face_classifier::dataset::{binarize_labels, load_gray_images, load_images_with_extension, split_dataset};
use face_classifier::haar::{FeatureType, HaarFeature};
use face_classifier::pca::{mean_face, pca, project, reconstruct};
use face_classifier::utils::image_conversion::rescale_intensity;
use face_classifier::utils::OutputWriter;
use face_classifier::viola_jones::ViolaJones;
use log::{info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, global = true)]
    config: Option<String>,

    /// Directory for generated images (overrides the configuration)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a preview image of each Haar feature type
    Features,

    /// Compute the mean face and eigenfaces of an image folder
    Pca {
        /// Folder of labelled face images
        #[arg(long)]
        dir: PathBuf,
    },

    /// Train generic boosting on an image folder and report accuracy
    Boost {
        /// Folder of labelled face images
        #[arg(long)]
        dir: PathBuf,
    },

    /// Train Viola-Jones and scan an image for a face
    Detect {
        /// Folder of 24x24 face images
        #[arg(long)]
        pos: PathBuf,

        /// Folder of 24x24 non-face images
        #[arg(long)]
        neg: PathBuf,

        /// Image to scan
        #[arg(long)]
        image: PathBuf,

        /// Name of the annotated output image
        #[arg(long, default_value = "detection")]
        name: String,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    config.validate()?;

    let writer = OutputWriter::new(&config.output.directory);

    match args.command {
        Command::Features => preview_features(&writer),
        Command::Pca { dir } => run_pca(&config, &dir, &writer),
        Command::Boost { dir } => run_boosting(&config, &dir),
        Command::Detect { pos, neg, image, name } => run_detection(&config, &pos, &neg, &image, &name, &writer),
    }
}

fn preview_features(writer: &OutputWriter) -> Result<()> {
    for feat_type in FeatureType::ALL {
        let feature = HaarFeature::new(feat_type, (25, 30), (50, 100));
        feature.preview((200, 200), writer, None)?;
        info!("Wrote preview of {}", feature);
    }
    Ok(())
}

fn run_pca(config: &Config, dir: &Path, writer: &OutputWriter) -> Result<()> {
    let (width, height) = config.dataset.image_size;
    let (x, _) = load_images_with_extension(dir, (width, height), &config.dataset.extension)?;
    let shape = (height as usize, width as usize);

    let mean = mean_face(x.view())?;
    writer.write_grid(&as_image(mean.view(), shape)?, "mean_face")?;

    let (eigenvectors, eigenvalues) = pca(x.view(), config.pca.components)?;
    for (i, (vector, value)) in eigenvectors.columns().into_iter().zip(eigenvalues.iter()).enumerate() {
        info!("Eigenvalue {}: {:.3}", i + 1, value);
        let face = rescale_intensity(&as_image(vector, shape)?);
        writer.write_grid(&face, &format!("eigenface_{}", i + 1))?;
    }

    let coordinates = project(x.view(), mean.view(), eigenvectors.view())?;
    let restored = reconstruct(coordinates.view(), mean.view(), eigenvectors.view())?;
    let mse = (&restored - &x).mapv(|d| d * d).mean().unwrap_or_default();
    info!(
        "Reconstruction with {} components: mean squared error {:.3}",
        config.pca.components, mse
    );
    Ok(())
}

fn run_boosting(config: &Config, dir: &Path) -> Result<()> {
    let (x, labels) = load_images_with_extension(dir, config.dataset.image_size, &config.dataset.extension)?;
    let y = binarize_labels(labels.view(), config.dataset.positive_label);
    let split = split_dataset(x.view(), y.view(), config.dataset.split_ratio, config.dataset.split_mode())?;

    // Single weak classifier baseline
    let weights = Array1::from_elem(split.x_train.nrows(), 1.0 / split.x_train.nrows().max(1) as f64);
    let baseline = WeightedMeanLearner.train(split.x_train.view(), split.y_train.view(), weights.view())?;
    let baseline_predict = |data: ArrayView2<'_, f64>| -> Array1<f64> {
        data.axis_iter(Axis(0)).map(|row| baseline.predict(row)).collect()
    };
    info!(
        "Weak classifier: train accuracy {:.2}%, test accuracy {:.2}%",
        accuracy(baseline_predict(split.x_train.view()).view(), split.y_train.view()),
        accuracy(baseline_predict(split.x_test.view()).view(), split.y_test.view())
    );

    let mut boost = Boosting::from_config(split.x_train.clone(), split.y_train.clone(), &config.boosting)?;
    boost.train()?;
    let (correct, incorrect) = boost.evaluate()?;
    info!("Boosting: {} correct, {} incorrect on the training set", correct, incorrect);
    info!(
        "Boosting: train accuracy {:.2}%, test accuracy {:.2}%",
        accuracy(boost.predict(split.x_train.view())?.view(), split.y_train.view()),
        accuracy(boost.predict(split.x_test.view())?.view(), split.y_test.view())
    );
    Ok(())
}

fn run_detection(
    config: &Config,
    pos: &Path,
    neg: &Path,
    scene_path: &Path,
    name: &str,
    writer: &OutputWriter,
) -> Result<()> {
    let window = u32::try_from(config.viola_jones.window_size).context("Window size does not fit in u32")?;
    let extension = &config.dataset.extension;
    let pos_images = load_gray_images(pos, extension, Some((window, window)))?;
    let neg_images = load_gray_images(neg, extension, Some((window, window)))?;

    let mut vj = ViolaJones::new(&pos_images, &neg_images)?.with_config(&config.viola_jones)?;
    vj.train(config.viola_jones.num_classifiers)?;
    let (correct, incorrect) = vj.evaluate()?;
    info!("Viola-Jones: {} correct, {} incorrect on the training set", correct, incorrect);

    let scene = image::open(scene_path).with_context(|| format!("Failed to open {}", scene_path.display()))?;
    if vj.face_detection(&scene, writer, name)?.is_none() {
        warn!("No face detected in {}", scene_path.display());
    }
    Ok(())
}

/// Reshape a flattened row-major image
fn as_image(pixels: ArrayView1<'_, f64>, shape: (usize, usize)) -> Result<Array2<f64>> {
    Ok(Array2::from_shape_vec(shape, pixels.to_vec())?)
}

/// Percentage of predictions equal to their label
#[allow(clippy::cast_precision_loss)]
fn accuracy(predictions: ArrayView1<'_, f64>, labels: ArrayView1<'_, f64>) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predictions.iter().zip(labels.iter()).filter(|(p, y)| p == y).count();
    100.0 * correct as f64 / labels.len() as f64
}
