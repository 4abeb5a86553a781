use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use floe_common::config::METADATA_FILE_NAME;
use floe_common::{Error, Result, Settings};
use tracing::debug;

use crate::model::CatalogDefinition;

/// Anything that can produce a catalog on demand.
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> Result<CatalogDefinition>;

    /// Human-readable origin of the catalog, used in log fields.
    fn describe(&self) -> String;
}

/// Reads `<location>/metadata.json` and decodes it. Performs no caching.
#[derive(Debug, Clone)]
pub struct MetadataCatalogLoader {
    location: PathBuf,
}

impl MetadataCatalogLoader {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self { location: location.into() }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.location())
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.location.join(METADATA_FILE_NAME)
    }

    pub fn load(&self) -> Result<CatalogDefinition> {
        if self.location.as_os_str().is_empty() {
            return Err(Error::Config("file.location must be set".to_string()));
        }

        let path = self.metadata_path();
        let json = read_document(&path)?;
        debug!(path = %path.display(), bytes = json.len(), "read catalog document");

        CatalogDefinition::from_json(&json).map_err(|err| match err {
            Error::Parse(msg) => Error::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }
}

impl CatalogSource for MetadataCatalogLoader {
    fn load(&self) -> Result<CatalogDefinition> {
        MetadataCatalogLoader::load(self)
    }

    fn describe(&self) -> String {
        self.metadata_path().display().to_string()
    }
}

/// Reads the whole document in one pass; the handle is released when this returns.
fn read_document(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| Error::io(path, e))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Parse(format!("{}: document is not valid UTF-8: {}", path.display(), e)))
}
