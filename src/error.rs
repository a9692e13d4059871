use std::{io, path::PathBuf};

use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read assets directory {}: {source}", path.display())]
    AssetsRootUnreadable { path: PathBuf, source: io::Error },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("poison error of {0}")]
    Poison(String),
}

pub(crate) fn poison_error(component: &str) -> CatalogError {
    CatalogError::Poison(component.into())
}
