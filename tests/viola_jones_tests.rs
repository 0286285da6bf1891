//! Viola-Jones training, prediction and detection tests


use face_classifier::classifiers::{DecisionStump, FeatureClassifier, StumpLearner, WeakClassifier, WeakLearner};
use face_classifier::config::ViolaJonesConfig;
use face_classifier::detection::{extract_window, window_positions};
use face_classifier::haar::FeatureBank;
use face_classifier::integral_image::IntegralImage;
use face_classifier::training::TrainingState;
use face_classifier::utils::OutputWriter;
use face_classifier::viola_jones::ViolaJones;
use face_classifier::Result;
use image::{DynamicImage, GrayImage, Luma};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use test_helpers::{face_window, flat_window, patterned_image, single_feature_bank};

fn trained_flat_detector() -> Result<ViolaJones> {
    let pos = [flat_window(200.0), flat_window(200.0)];
    let neg = [flat_window(50.0), flat_window(50.0)];
    let mut vj = ViolaJones::new(&pos, &neg)?.with_feature_bank(single_feature_bank());
    vj.train(1)?;
    Ok(vj)
}

/// Stump learner that only ever looks at the last score column
struct LastColumnLearner;

impl WeakLearner for LastColumnLearner {
    type Classifier = DecisionStump;

    fn train(
        &self,
        data: ArrayView2<'_, f64>,
        labels: ArrayView1<'_, f64>,
        weights: ArrayView1<'_, f64>,
    ) -> Result<DecisionStump> {
        let last = data.ncols() - 1;
        let stump = StumpLearner.train(data.slice(s![.., last..]), labels, weights)?;
        Ok(DecisionStump::new(last, stump.threshold(), stump.polarity(), stump.error()))
    }
}

#[test]
fn test_single_feature_end_to_end() -> Result<()> {
    let vj = trained_flat_detector()?;

    assert_eq!(vj.ensemble().len(), 1);
    assert_eq!(vj.ensemble().classifiers()[0].feature(), 0);
    assert!(vj.ensemble().alphas()[0] > 0.0);
    assert_eq!(vj.evaluate()?, (4, 0));
    assert_eq!(
        vj.predict(&[flat_window(210.0), flat_window(40.0)])?,
        vec![1.0, -1.0]
    );
    Ok(())
}

#[test]
fn test_zero_rounds_predict_negative() -> Result<()> {
    let mut vj = ViolaJones::new(&[flat_window(200.0)], &[flat_window(50.0)])?.with_feature_bank(single_feature_bank());
    vj.train(0)?;

    assert!(vj.ensemble().is_empty());
    assert_eq!(vj.state(), TrainingState::Uninitialized);
    assert_eq!(vj.predict(&[flat_window(200.0), flat_window(50.0)])?, vec![-1.0, -1.0]);
    Ok(())
}

#[test]
fn test_training_is_deterministic_on_full_bank() -> Result<()> {
    let pos: Vec<Array2<f64>> = (0..3).map(|i| face_window(180.0 + f64::from(i) * 10.0, 60.0)).collect();
    let neg: Vec<Array2<f64>> = (0..3).map(|i| patterned_image(24, 24, i)).collect();

    let run = || -> Result<(Vec<f64>, Vec<String>)> {
        let mut vj = ViolaJones::new(&pos, &neg)?;
        vj.create_haar_features();
        vj.train(3)?;
        let descriptions = vj.ensemble().classifiers().iter().map(|c| c.describe()).collect();
        Ok((vj.ensemble().alphas(), descriptions))
    };

    let first = run()?;
    assert!(!first.0.is_empty());
    assert_eq!(first, run()?);
    Ok(())
}

#[test]
fn test_full_bank_separates_faces() -> Result<()> {
    let pos: Vec<Array2<f64>> = (0..3).map(|i| face_window(200.0 - f64::from(i) * 5.0, 40.0)).collect();
    let neg: Vec<Array2<f64>> = (0..3).map(|i| flat_window(90.0 + f64::from(i) * 30.0)).collect();

    let mut vj = ViolaJones::new(&pos, &neg)?;
    vj.create_haar_features();
    assert_eq!(vj.haar_features().len(), 13_188);
    vj.train(2)?;

    assert_eq!(vj.evaluate()?, (6, 0));
    Ok(())
}

#[test]
fn test_custom_learner_is_used() -> Result<()> {
    let bank = FeatureBank::new(24, 12, &[(2, 1), (3, 1)])?;
    let last = bank.len() - 1;
    let mut vj = ViolaJones::with_learner(&[face_window(200.0, 40.0)], &[flat_window(100.0)], LastColumnLearner)?
        .with_feature_bank(bank);
    vj.train(2)?;

    assert!(vj.ensemble().iter().all(|(stump, _)| stump.feature() == last));
    Ok(())
}

#[test]
fn test_retraining_starts_from_scratch() -> Result<()> {
    let mut vj = trained_flat_detector()?;
    vj.train(1)?;
    assert_eq!(vj.ensemble().len(), 1);

    vj.set_feature_bank(single_feature_bank());
    assert!(vj.ensemble().is_empty());
    Ok(())
}

#[test]
fn test_face_detection_writes_annotated_image() -> Result<()> {
    let vj = trained_flat_detector()?;
    let dir = tempfile::tempdir()?;
    let writer = OutputWriter::new(dir.path());

    // Every one of the 6x6 window positions is bright
    let scene = DynamicImage::ImageLuma8(GrayImage::from_pixel(30, 30, Luma([200])));
    let face = vj.face_detection(&scene, &writer, "scene")?.expect("bright scene has a face");

    assert_eq!(face.windows, 36);
    // Mean corners (2, 2) and (26, 26), shifted by (+3, -3)
    assert_eq!(face.top_left, (5, -1));
    assert_eq!(face.bottom_right, (29, 23));

    let saved = image::open(dir.path().join("scene.png"))?.to_rgb8();
    assert_eq!(saved.dimensions(), (30, 30));
    assert_eq!(saved.get_pixel(5, 10).0, [255, 0, 0]);
    assert_eq!(saved.get_pixel(15, 15).0, [200, 200, 200]);
    Ok(())
}

#[test]
fn test_no_face_writes_nothing() -> Result<()> {
    let vj = trained_flat_detector()?;
    let dir = tempfile::tempdir()?;
    let writer = OutputWriter::new(dir.path());

    let scene = DynamicImage::ImageLuma8(GrayImage::from_pixel(30, 30, Luma([50])));
    assert_eq!(vj.face_detection(&scene, &writer, "empty")?, None);
    assert!(!dir.path().join("empty.png").exists());
    Ok(())
}

#[test]
fn test_scene_smaller_than_window() -> Result<()> {
    let vj = trained_flat_detector()?;
    let scene = DynamicImage::ImageLuma8(GrayImage::from_pixel(20, 20, Luma([200])));
    assert_eq!(vj.detect(&scene)?, None);
    Ok(())
}

#[test]
fn test_config_offset_applies() -> Result<()> {
    let config = ViolaJonesConfig {
        feature_types: vec![(3, 1)],
        detection_offset: (0, 0),
        ..ViolaJonesConfig::default()
    };
    let pos = [flat_window(200.0), flat_window(200.0)];
    let neg = [flat_window(50.0), flat_window(50.0)];
    let mut vj = ViolaJones::new(&pos, &neg)?.with_config(&config)?;
    assert_eq!(vj.haar_features().len(), 2184);
    vj.train(1)?;

    let scene = DynamicImage::ImageLuma8(GrayImage::from_pixel(30, 30, Luma([200])));
    let face = vj.detect(&scene)?.expect("bright scene has a face");
    assert_eq!(face.top_left, (2, 2));
    assert_eq!(face.bottom_right, (26, 26));
    Ok(())
}

#[test]
fn test_scene_windows_match_cropped_windows() -> Result<()> {
    let pos: Vec<Array2<f64>> = (0..3).map(|i| face_window(200.0 - f64::from(i) * 5.0, 40.0)).collect();
    let neg: Vec<Array2<f64>> = (0..3).map(|i| patterned_image(24, 24, i)).collect();
    let bank = FeatureBank::new(24, 6, &[(2, 1), (3, 1), (2, 2)])?;
    let mut vj = ViolaJones::new(&pos, &neg)?.with_feature_bank(bank);
    vj.train(3)?;

    // Face-like bands on a textured background
    let mut scene = patterned_image(40, 52, 9);
    scene.slice_mut(s![6..30, 10..34]).assign(&face_window(200.0, 40.0));
    let positions = window_positions(40, 52, 24);

    let cropped: Vec<Array2<f64>> = positions
        .iter()
        .map(|&p| extract_window(&scene, p, 24).map(|w| w.to_owned()))
        .collect::<Result<_>>()?;
    let expected = vj.predict(&cropped)?;
    let actual = vj.predict_windows(&IntegralImage::new(&scene), &positions)?;

    assert_eq!(actual.len(), 16 * 28);
    assert_eq!(actual, expected);
    assert!(actual.contains(&1.0));
    Ok(())
}

#[test]
fn test_scene_window_out_of_bounds() -> Result<()> {
    let vj = trained_flat_detector()?;
    let scene = IntegralImage::new(&flat_window(200.0));
    let positions = window_positions(30, 30, 24);
    assert!(vj.predict_windows(&scene, &positions).is_err());
    assert_eq!(vj.predict_windows(&scene, &[])?, Vec::<f64>::new());
    Ok(())
}
