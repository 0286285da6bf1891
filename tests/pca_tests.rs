//! Eigenface decomposition tests


use face_classifier::pca::{mean_face, pca, project, reconstruct};
use face_classifier::Result;
use ndarray::{Array1, Array2, Axis};
use test_helpers::patterned_image;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{a} != {b}");
}

#[test]
fn test_eigenvalues_descend_and_vectors_are_orthonormal() -> Result<()> {
    let x = patterned_image(12, 6, 5);
    let (vectors, values) = pca(x.view(), 4)?;

    assert_eq!(vectors.dim(), (6, 4));
    assert_eq!(values.len(), 4);
    for pair in values.to_vec().windows(2) {
        assert!(pair[0] >= pair[1]);
    }
    // Scatter matrices are positive semi-definite
    assert!(values.iter().all(|&v| v > -1e-6));

    let gram = vectors.t().dot(&vectors);
    for ((r, c), &value) in gram.indexed_iter() {
        assert_close(value, if r == c { 1.0 } else { 0.0 });
    }
    Ok(())
}

#[test]
fn test_eigenpairs_satisfy_scatter_equation() -> Result<()> {
    let x = patterned_image(10, 5, 2);
    let (vectors, values) = pca(x.view(), 5)?;

    let mean = mean_face(x.view())?;
    let centred = &x - &mean;
    let scatter = centred.t().dot(&centred);

    for (k, &lambda) in values.iter().enumerate() {
        let v = vectors.column(k);
        let av = scatter.dot(&v);
        for (lhs, rhs) in av.iter().zip(v.iter()) {
            assert_close(*lhs, lambda * rhs);
        }
    }
    Ok(())
}

#[test]
fn test_mean_face_of_identical_rows() -> Result<()> {
    let row = Array1::from(vec![3.0, 1.0, 4.0, 1.0]);
    let x = Array2::from_shape_fn((5, 4), |(_, c)| row[c]);
    assert_eq!(mean_face(x.view())?, row);
    Ok(())
}

#[test]
fn test_projection_is_centred() -> Result<()> {
    let x = patterned_image(8, 6, 1);
    let mean = mean_face(x.view())?;
    let (vectors, _) = pca(x.view(), 3)?;

    let coords = project(x.view(), mean.view(), vectors.view())?;
    assert_eq!(coords.dim(), (8, 3));
    let coord_mean = coords.mean_axis(Axis(0)).unwrap_or_default();
    assert!(coord_mean.iter().all(|m| m.abs() < 1e-6));

    // A truncated basis leaves at most the total scatter as residual
    let back = reconstruct(coords.view(), mean.view(), vectors.view())?;
    let residual: f64 = (&back - &x).mapv(|d| d * d).sum();
    let spread: f64 = (&x - &mean).mapv(|d| d * d).sum();
    assert!(residual <= spread + 1e-6);
    Ok(())
}

#[test]
fn test_mismatched_shapes_are_rejected() -> Result<()> {
    let x = patterned_image(6, 4, 0);
    let mean = mean_face(x.view())?;
    let (vectors, _) = pca(x.view(), 2)?;

    let wider = patterned_image(6, 5, 0);
    assert!(project(wider.view(), mean.view(), vectors.view()).is_err());
    assert!(reconstruct(Array2::zeros((2, 3)).view(), mean.view(), vectors.view()).is_err());
    Ok(())
}
