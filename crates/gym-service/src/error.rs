//! Façade-level error type.

use gym_kernel::GymError;
use gym_store::StoreError;

use crate::config::ConfigError;

pub const STORE_IO_FAILURE: &str = "store_io_failure";
pub const CONFIG_INVALID: &str = "config_invalid";

/// Everything a façade operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum ClubError {
    #[error(transparent)]
    Domain(#[from] GymError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ClubError {
    /// Stable machine-readable class for JSON output.
    pub fn failure_class(&self) -> &'static str {
        match self {
            Self::Domain(err) => err.failure_class(),
            Self::Store(_) => STORE_IO_FAILURE,
            Self::Config(_) => CONFIG_INVALID,
        }
    }

    /// The domain failure, if this is one.
    pub fn domain(&self) -> Option<&GymError> {
        match self {
            Self::Domain(err) => Some(err),
            _ => None,
        }
    }
}
