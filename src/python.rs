use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::prelude::*;
use sprs::CsMat;

use crate::error::RecError;
use crate::evaluation::align_predictions;
use crate::seen::{suppress_seen_items, SeenIndex};
use crate::surface::ScoreSurface;
use crate::topk::extract_topk;

fn seen_index(users: Option<PyReadonlyArray1<i64>>, items: Option<PyReadonlyArray1<i64>>) -> PyResult<Option<SeenIndex>> {
    match (users, items) {
        (None, None) => Ok(None),
        (Some(users), Some(items)) => {
            let users = to_ids(users.as_array().iter())?;
            let items = to_ids(items.as_array().iter())?;
            Ok(Some(SeenIndex::new(users, items)?))
        }
        _ => Err(RecError::ShapeMismatch("seen users and seen items must be given together".to_string()).into()),
    }
}

fn to_ids<'a, I: Iterator<Item = &'a i64>>(ids: I) -> PyResult<Vec<usize>> {
    ids.map(|&id| usize::try_from(id)
            .map_err(|_| RecError::ShapeMismatch(format!("negative id {}", id)).into()))
        .collect()
}

/// Top-k item ids of a dense score matrix, optionally suppressing seen items first.
#[pyfunction]
#[pyo3(signature = (scores, k, seen_users=None, seen_items=None))]
fn topk_dense<'py>(
    py: Python<'py>,
    scores: PyReadonlyArray2<f64>,
    k: usize,
    seen_users: Option<PyReadonlyArray1<i64>>,
    seen_items: Option<PyReadonlyArray1<i64>>,
) -> PyResult<&'py PyArray2<i64>> {
    let mut surface = ScoreSurface::dense(scores.as_array().to_owned());
    if let Some(seen) = seen_index(seen_users, seen_items)? {
        suppress_seen_items(&mut surface, &seen)?;
    }
    Ok(extract_topk(&surface, k)?.into_pyarray(py))
}

/// Top-k item ids of a CSR score matrix given by its scipy components.
/// Short rows are padded with -1.
#[pyfunction]
#[pyo3(signature = (num_rows, num_cols, indptr, indices, data, k, seen_users=None, seen_items=None))]
#[allow(clippy::too_many_arguments)]
fn topk_csr<'py>(
    py: Python<'py>,
    num_rows: usize,
    num_cols: usize,
    indptr: PyReadonlyArray1<i32>,
    indices: PyReadonlyArray1<i32>,
    data: PyReadonlyArray1<f64>,
    k: usize,
    seen_users: Option<PyReadonlyArray1<i64>>,
    seen_items: Option<PyReadonlyArray1<i64>>,
) -> PyResult<&'py PyArray2<i64>> {
    let indptr: Vec<usize> = indptr.as_array().iter().map(|&offset| offset as usize).collect();
    let indices: Vec<usize> = indices.as_array().iter().map(|&column| column as usize).collect();
    let data: Vec<f64> = data.as_array().to_vec();

    let scores = CsMat::try_new((num_rows, num_cols), indptr, indices, data)
        .map_err(|(_, _, _, error)| RecError::ShapeMismatch(error.to_string()))?;

    let mut surface = ScoreSurface::sparse(scores);
    if let Some(seen) = seen_index(seen_users, seen_items)? {
        suppress_seen_items(&mut surface, &seen)?;
    }
    Ok(extract_topk(&surface, k)?.into_pyarray(py))
}

/// Boolean users × topk × holdout match cube and the truncation message, if any.
#[pyfunction]
fn match_predictions<'py>(
    py: Python<'py>,
    recommendations: PyReadonlyArray2<i64>,
    holdout: PyReadonlyArray2<i64>,
) -> PyResult<(&'py PyArray3<bool>, Option<String>)> {
    let aligned = align_predictions(recommendations.as_array(), holdout.as_array());
    let truncation = aligned.truncation.map(|truncation| truncation.to_string());
    Ok((aligned.matches.into_pyarray(py), truncation))
}

#[pymodule]
fn recscore(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(topk_dense, m)?)?;
    m.add_function(wrap_pyfunction!(topk_csr, m)?)?;
    m.add_function(wrap_pyfunction!(match_predictions, m)?)?;
    Ok(())
}
