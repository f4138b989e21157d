//! Models and emission sequences on disk.
//!
//! A model directory holds three flat text containers:
//!
//! ```text
//! model/
//!   initial.txt      1-D, N entries
//!   transition.txt   2-D, N x N
//!   emission.txt     2-D, N x K
//! ```
//!
//! An emission sequence is a single 1-D integer container.

use std::fs;
use std::path::{Path, PathBuf};

use hmm_math::{matrix_to_text, parse_matrix, parse_vector, vector_to_text, ContainerError};
use thiserror::Error;

use crate::inference::{Hmm, HmmError};

pub const INITIAL_FILE: &str = "initial.txt";
pub const TRANSITION_FILE: &str = "transition.txt";
pub const EMISSION_FILE: &str = "emission.txt";

/// Errors from reading or writing model files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed container in {path}: {source}")]
    Container {
        path: PathBuf,
        #[source]
        source: ContainerError,
    },

    #[error("invalid model in {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: HmmError,
    },
}

impl StoreError {
    pub fn path(&self) -> &Path {
        match self {
            StoreError::Io { path, .. }
            | StoreError::Container { path, .. }
            | StoreError::Model { path, .. } => path,
        }
    }
}

impl From<StoreError> for hmm_common::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io { path, source } => hmm_common::Error::Io(std::io::Error::new(
                source.kind(),
                format!("{}: {}", path.display(), source),
            )),
            StoreError::Container { source, .. } => hmm_common::Error::Container(source),
            StoreError::Model { path, source } => match hmm_common::Error::from(source) {
                hmm_common::Error::InvalidModel(msg) => {
                    hmm_common::Error::InvalidModel(format!("{}: {}", path.display(), msg))
                }
                other => other,
            },
        }
    }
}

fn read_text(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), StoreError> {
    fs::write(path, text).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn container_error(path: &Path) -> impl FnOnce(ContainerError) -> StoreError + '_ {
    move |source| StoreError::Container {
        path: path.to_path_buf(),
        source,
    }
}

/// Read and validate the model stored in `dir`.
pub fn load_model(dir: &Path) -> Result<Hmm, StoreError> {
    let initial_path = dir.join(INITIAL_FILE);
    let transition_path = dir.join(TRANSITION_FILE);
    let emission_path = dir.join(EMISSION_FILE);

    let initial =
        parse_vector::<f64>(&read_text(&initial_path)?).map_err(container_error(&initial_path))?;
    let transitions = parse_matrix::<f64>(&read_text(&transition_path)?)
        .map_err(container_error(&transition_path))?;
    let emissions = parse_matrix::<f64>(&read_text(&emission_path)?)
        .map_err(container_error(&emission_path))?;

    Hmm::new(initial, transitions, emissions).map_err(|source| StoreError::Model {
        path: dir.to_path_buf(),
        source,
    })
}

/// Write `hmm` into `dir`, creating the directory if needed.
pub fn save_model(dir: &Path, hmm: &Hmm) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let transition_path = dir.join(TRANSITION_FILE);
    let emission_path = dir.join(EMISSION_FILE);
    let transitions = matrix_to_text(hmm.transition_probabilities())
        .map_err(container_error(&transition_path))?;
    let emissions =
        matrix_to_text(hmm.emission_probabilities()).map_err(container_error(&emission_path))?;

    write_text(&dir.join(INITIAL_FILE), &vector_to_text(hmm.initial_distribution()))?;
    write_text(&transition_path, &transitions)?;
    write_text(&emission_path, &emissions)?;
    Ok(())
}

/// Read an emission sequence. Symbol range is checked by the model, not here.
pub fn load_sequence(path: &Path) -> Result<Vec<usize>, StoreError> {
    parse_vector::<usize>(&read_text(path)?).map_err(container_error(path))
}

pub fn save_sequence(path: &Path, sequence: &[usize]) -> Result<(), StoreError> {
    write_text(path, &vector_to_text(sequence))
}
