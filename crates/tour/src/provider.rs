use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::ProviderError;
use crate::location::TourData;

/// Source of locations and points of interest.
pub trait TourDataProvider {
    fn fetch(&self) -> Result<TourData, ProviderError>;
}

/// Data that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    data: TourData,
}

impl StaticProvider {
    pub fn new(mut data: TourData) -> Self {
        data.normalize();
        Self { data }
    }
}

impl TourDataProvider for StaticProvider {
    fn fetch(&self) -> Result<TourData, ProviderError> {
        Ok(self.data.clone())
    }
}

/// Reads `{ "locations": [...], "ports": [...] }` from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TourDataProvider for JsonFileProvider {
    fn fetch(&self) -> Result<TourData, ProviderError> {
        let payload = fs::read_to_string(&self.path).map_err(|source| ProviderError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut data: TourData = serde_json::from_str(&payload)?;
        data.normalize();
        Ok(data)
    }
}

/// Fetches from `provider`, falling back to an empty tour on failure.
pub fn fetch_or_empty(provider: &dyn TourDataProvider) -> (TourData, Option<ProviderError>) {
    match provider.fetch() {
        Ok(data) => {
            info!(
                locations = data.locations.len(),
                ports = data.ports.len(),
                "tour data loaded"
            );
            (data, None)
        }
        Err(err) => {
            warn!("tour data unavailable, continuing with an empty tour: {err}");
            (TourData::empty(), Some(err))
        }
    }
}
