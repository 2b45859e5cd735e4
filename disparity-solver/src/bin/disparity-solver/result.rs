use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;

use disparity_solver::core::backends::BackendError;
use disparity_solver::core::GraphConstructionError;
use disparity_solver::core::ImageError;
use disparity_solver::core::LabelingError;
use disparity_solver::pgm_format::PgmError;
use thiserror::Error;

pub(crate) type DisparityResult<T> = Result<T, DisparityError>;

#[derive(Error, Debug)]
pub(crate) enum DisparityError {
    #[error("IO error, more details: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Failed to open the image {path}, more details: {source}")]
    OpenImage {
        path: String,
        source: std::io::Error,
    },
    #[error("The image {path} is not a valid PGM image, more details: {source}")]
    InvalidPgm { path: String, source: PgmError },
    #[error("The image {path} is inconsistent, more details: {source}")]
    InvalidImage { path: String, source: ImageError },
    #[error("The stereo pair cannot be matched, more details: {0}")]
    InvalidStereoPair(#[from] GraphConstructionError),
    #[error("The backend could not be started, more details: {0}")]
    Backend(#[from] BackendError),
    #[error("No disparity map was found, more details: {0}")]
    Labeling(#[from] LabelingError),
}

impl DisparityError {
    pub(crate) fn open_image(path: &Path, source: std::io::Error) -> Self {
        Self::OpenImage {
            path: format!("{}", path.display()),
            source,
        }
    }

    pub(crate) fn invalid_pgm(path: &Path, source: PgmError) -> Self {
        Self::InvalidPgm {
            path: format!("{}", path.display()),
            source,
        }
    }

    pub(crate) fn invalid_image(path: &Path, source: ImageError) -> Self {
        Self::InvalidImage {
            path: format!("{}", path.display()),
            source,
        }
    }

    /// Errors in the input are reported as invalid arguments; a failure of the solver itself on
    /// a valid input is a logic error.
    pub(crate) fn category(&self) -> ErrorCategory {
        match self {
            DisparityError::Labeling(_) => ErrorCategory::LogicError,
            DisparityError::IOError(_)
            | DisparityError::OpenImage { .. }
            | DisparityError::InvalidPgm { .. }
            | DisparityError::InvalidImage { .. }
            | DisparityError::InvalidStereoPair(_)
            | DisparityError::Backend(_) => ErrorCategory::InvalidArgument,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ErrorCategory {
    InvalidArgument,
    LogicError,
}

impl Display for ErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::InvalidArgument => write!(f, "Invalid argument"),
            ErrorCategory::LogicError => write!(f, "Logic error"),
        }
    }
}
