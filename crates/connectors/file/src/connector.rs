use std::sync::Arc;

use floe_common::{Result, Settings};
use tracing::info;

use crate::planner::SplitPlanner;
use crate::registry::SchemaRegistry;
use crate::split_manager::SplitManager;

/// A configured file connector: one registry and one split manager sharing it.
pub struct FileConnector {
    registry: Arc<SchemaRegistry>,
    split_manager: SplitManager,
}

impl FileConnector {
    pub fn new(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let registry = Arc::new(SchemaRegistry::from_settings(settings));
        let planner = SplitPlanner::from_settings(settings)?;
        info!(
            location = %settings.location().display(),
            policy = ?planner.policy(),
            "file connector configured"
        );
        Ok(Self {
            split_manager: SplitManager::new(Arc::clone(&registry), planner),
            registry,
        })
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn split_manager(&self) -> &SplitManager {
        &self.split_manager
    }
}
