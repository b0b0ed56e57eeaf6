use super::types::SaveTrigger;
use crate::utils::error::{describe_error, AppError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutoSaveError {
    #[error("{trigger} save failed: {message}")]
    Persistence {
        trigger: SaveTrigger,
        message: String,
    },

    #[error("invalid auto-save configuration: {0}")]
    InvalidConfig(String),
}

pub type AutoSaveResult<T> = Result<T, AutoSaveError>;

impl AutoSaveError {
    pub fn persistence(trigger: SaveTrigger, err: &AppError) -> Self {
        AutoSaveError::Persistence {
            trigger,
            message: describe_error(err),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AutoSaveError::Persistence { message, .. } => message,
            AutoSaveError::InvalidConfig(message) => message,
        }
    }

    pub fn trigger(&self) -> Option<SaveTrigger> {
        match self {
            AutoSaveError::Persistence { trigger, .. } => Some(*trigger),
            AutoSaveError::InvalidConfig(_) => None,
        }
    }
}
