//! Supporting glue for MiniGrid experiments: environment wrappers that turn
//! symbolic byte frames into torch tensors, option augmentation, a metrics
//! registry and a config pretty-printer.

use thiserror::Error;

pub mod env;
pub mod metrics;
pub mod options;
pub mod panic_hook;

#[derive(Error, Debug)]
pub enum Error {
    /// The converter only accepts frames shaped `[7, 7, 3k]`.
    #[error("frame shape mismatch: expected [7, 7, 3k], found {found:?}")]
    ShapeMismatch { found: [usize; 3] },

    #[error("unknown compute device {0:?} (expected cpu, cuda, cuda:N or mps)")]
    InvalidDevice(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Py(#[from] pyo3::PyErr),
}

pub type Result<T> = std::result::Result<T, Error>;
