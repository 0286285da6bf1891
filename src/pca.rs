//! Principal component analysis over flattened face images ("eigenfaces").

use crate::{Error, Result};
use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Column-wise mean of a data matrix (rows are samples)
///
/// # Errors
///
/// Returns `InvalidInput` for a matrix with no rows
pub fn mean_face(x: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
    x.mean_axis(Axis(0))
        .ok_or_else(|| Error::InvalidInput("Cannot average an empty data matrix".to_string()))
}

/// Top `k` eigenvectors (as columns, `d x k`) and eigenvalues of the scatter matrix
///
/// The data is centred on its mean face and the scatter matrix `C^T C` is
/// decomposed. Eigenvalues are returned in descending order, each column of
/// the eigenvector matrix has unit length.
///
/// # Errors
///
/// Returns `InvalidInput` if `x` is empty or `k` is zero or larger than the
/// number of columns, and `LinearAlgebra` if the decomposition does not
/// converge
pub fn pca(x: ArrayView2<'_, f64>, k: usize) -> Result<(Array2<f64>, Array1<f64>)> {
    let (samples, dims) = x.dim();
    if samples == 0 || dims == 0 {
        return Err(Error::InvalidInput(format!("Cannot run PCA on a {samples}x{dims} matrix")));
    }
    if k == 0 || k > dims {
        return Err(Error::InvalidInput(format!(
            "Cannot keep {k} components of {dims}-dimensional data"
        )));
    }

    let mean = mean_face(x)?;
    let centred = &x - &mean;
    let scatter = centred.t().dot(&centred);
    debug!("Decomposing {dims}x{dims} scatter matrix of {samples} samples");

    let matrix = DMatrix::from_fn(dims, dims, |r, c| scatter[[r, c]]);
    let eigen = SymmetricEigen::try_new(matrix, f64::EPSILON, 0)
        .ok_or_else(|| Error::LinearAlgebra("Eigen-decomposition did not converge".to_string()))?;

    let mut order: Vec<usize> = (0..dims).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    order.truncate(k);

    let eigenvalues = order.iter().map(|&i| eigen.eigenvalues[i]).collect();
    let eigenvectors = Array2::from_shape_fn((dims, k), |(r, c)| eigen.eigenvectors[(r, order[c])]);

    Ok((eigenvectors, eigenvalues))
}

/// Coordinates of each sample in the basis of `eigenvectors` (`samples x k`)
///
/// # Errors
///
/// Returns `ShapeMismatch` if the dimensions of `x`, `mean` and
/// `eigenvectors` disagree
pub fn project(x: ArrayView2<'_, f64>, mean: ArrayView1<'_, f64>, eigenvectors: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    if x.ncols() != mean.len() || mean.len() != eigenvectors.nrows() {
        return Err(Error::ShapeMismatch(format!(
            "data has {} columns, mean {} entries, eigenvectors {} rows",
            x.ncols(),
            mean.len(),
            eigenvectors.nrows()
        )));
    }
    Ok((&x - &mean).dot(&eigenvectors))
}

/// Map projected coordinates back to image space
///
/// # Errors
///
/// Returns `ShapeMismatch` if the dimensions disagree
pub fn reconstruct(
    coordinates: ArrayView2<'_, f64>,
    mean: ArrayView1<'_, f64>,
    eigenvectors: ArrayView2<'_, f64>,
) -> Result<Array2<f64>> {
    if coordinates.ncols() != eigenvectors.ncols() || mean.len() != eigenvectors.nrows() {
        return Err(Error::ShapeMismatch(format!(
            "{} coordinates per sample for {} eigenvectors of length {}",
            coordinates.ncols(),
            eigenvectors.ncols(),
            eigenvectors.nrows()
        )));
    }
    Ok(coordinates.dot(&eigenvectors.t()) + &mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mean_face() {
        let x = array![[1.0, 2.0], [3.0, 6.0]];
        assert_eq!(mean_face(x.view()).unwrap(), array![2.0, 4.0]);
        assert!(mean_face(Array2::<f64>::zeros((0, 2)).view()).is_err());
    }

    #[test]
    fn test_pca_along_a_line() {
        // Points on y = 2x: all variance along (1, 2) / sqrt(5)
        let x = array![[0.0, 0.0], [1.0, 2.0], [2.0, 4.0], [3.0, 6.0]];
        let (vectors, values) = pca(x.view(), 2).unwrap();

        assert_eq!(vectors.dim(), (2, 2));
        // Scatter along the line: 5 * sum((x - 1.5)^2) = 5 * 5
        assert!((values[0] - 25.0).abs() < 1e-9);
        assert!(values[1].abs() < 1e-9);

        let first = vectors.column(0);
        let expected = [1.0 / 5.0_f64.sqrt(), 2.0 / 5.0_f64.sqrt()];
        let sign = first[0].signum();
        assert!((sign * first[0] - expected[0]).abs() < 1e-9);
        assert!((sign * first[1] - expected[1]).abs() < 1e-9);
    }

    #[test]
    fn test_pca_rejects_bad_k() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(pca(x.view(), 0).is_err());
        assert!(pca(x.view(), 3).is_err());
    }

    #[test]
    fn test_project_and_reconstruct_full_basis() {
        let x = array![[1.0, 0.0, 2.0], [0.0, 3.0, 1.0], [4.0, 1.0, 0.0], [2.0, 2.0, 2.0]];
        let mean = mean_face(x.view()).unwrap();
        let (vectors, _) = pca(x.view(), 3).unwrap();

        let coords = project(x.view(), mean.view(), vectors.view()).unwrap();
        assert_eq!(coords.dim(), (4, 3));

        let back = reconstruct(coords.view(), mean.view(), vectors.view()).unwrap();
        for (a, b) in back.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
