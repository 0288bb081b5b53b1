//! Workload Loader.
//!
//! A workload is a JSON file holding one weight matrix and one input vector:
//!
//! ```json
//! { "matrix": [[1, -2], [3, 4]], "vector": [5, -6] }
//! ```
//!
//! The matrix is programmed once and the vector is multiplied `repeat` times,
//! which is how read disturb accumulates between writes.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::common::{Result, XbarError};
use crate::xbar::Crossbar;

/// Weight matrix and input vector of one run.
#[derive(Debug, Clone, Deserialize)]
pub struct Workload {
    pub matrix: Vec<Vec<i32>>,
    pub vector: Vec<i32>,
}

impl Workload {
    /// Reads a workload from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| XbarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let workload: Workload = serde_json::from_str(&content).map_err(|e| XbarError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let cols = workload.cols();
        if let Some(row) = workload.matrix.iter().find(|row| row.len() != cols) {
            return Err(XbarError::Parse {
                path: path.to_path_buf(),
                reason: format!("ragged matrix: row of {} entries, expected {}", row.len(), cols),
            });
        }
        Ok(workload)
    }

    pub fn rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn cols(&self) -> usize {
        self.matrix.first().map_or(0, Vec::len)
    }

    /// Row-major copy of the matrix.
    pub fn flat_matrix(&self) -> Vec<i32> {
        self.matrix.iter().flatten().copied().collect()
    }
}

/// Writes the workload matrix and runs `repeat` MVMs with its vector.
///
/// # Arguments
///
/// * `xbar` - Target crossbar.
/// * `workload` - Matrix and vector.
/// * `repeat` - Number of MVMs; must be at least 1.
///
/// # Returns
///
/// The result of the last MVM.
pub fn run_workload(xbar: &mut Crossbar, workload: &Workload, repeat: u64) -> Result<Vec<i32>> {
    let (m, n) = (workload.rows(), workload.cols());
    xbar.write(&workload.flat_matrix(), m, n)?;

    let mut result = vec![0; m];
    for _ in 0..repeat.max(1) {
        result.fill(0);
        xbar.mvm(&mut result, &workload.vector, m, n)?;
    }

    info!(
        mvms = xbar.mvm_count(),
        refreshes = xbar.refresh_count(),
        refreshed_cells = xbar.refreshed_cell_count(),
        "workload finished"
    );
    Ok(result)
}
