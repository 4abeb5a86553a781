use std::collections::BTreeSet;
use std::sync::Arc;

use floe_cache::{Memo, MemoState};
use floe_common::{Error, Result, Settings};
use tracing::{info, warn};

use crate::loader::{CatalogSource, MetadataCatalogLoader};
use crate::model::{CatalogDefinition, TableDefinition};

/// Load state of a [`SchemaRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Unloaded,
    Loaded,
    Failed,
}

impl From<MemoState> for RegistryState {
    fn from(state: MemoState) -> Self {
        match state {
            MemoState::Unloaded => RegistryState::Unloaded,
            MemoState::Loaded => RegistryState::Loaded,
            MemoState::Failed => RegistryState::Failed,
        }
    }
}

/// Owns the connector's catalog, loaded lazily on first access.
///
/// The first accessor call loads the catalog exactly once; concurrent callers
/// wait for that load. A failed load is kept and returned to every later
/// caller until [`SchemaRegistry::reset`] is called.
pub struct SchemaRegistry {
    source: Arc<dyn CatalogSource>,
    catalog: Memo<CatalogDefinition, Error>,
}

impl SchemaRegistry {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            catalog: Memo::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(Arc::new(MetadataCatalogLoader::from_settings(settings)))
    }

    /// Returns the shared catalog, loading it if this is the first access.
    pub fn catalog(&self) -> Result<Arc<CatalogDefinition>> {
        self.catalog.get_or_load(|| self.load_catalog())
    }

    pub fn schema_names(&self) -> Result<BTreeSet<String>> {
        Ok(self.catalog()?.schema_names().map(str::to_string).collect())
    }

    /// Table names of `schema_name`; empty if the schema does not exist.
    pub fn table_names(&self, schema_name: &str) -> Result<BTreeSet<String>> {
        let catalog = self.catalog()?;
        Ok(catalog
            .schema(schema_name)
            .map(|schema| schema.table_names().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Looks up a table. `Ok(None)` when either the schema or the table is absent.
    pub fn table(&self, schema_name: &str, table_name: &str) -> Result<Option<TableDefinition>> {
        Ok(self.catalog()?.table(schema_name, table_name).cloned())
    }

    pub fn state(&self) -> RegistryState {
        self.catalog.state().into()
    }

    /// Forgets the cached catalog or failure so the next access reloads.
    pub fn reset(&self) {
        self.catalog.reset();
        info!(source = %self.source.describe(), "catalog reset");
    }

    fn load_catalog(&self) -> Result<CatalogDefinition> {
        let origin = self.source.describe();
        match self.source.load() {
            Ok(catalog) => {
                info!(
                    source = %origin,
                    schemas = catalog.schema_count(),
                    tables = catalog.table_count(),
                    "catalog loaded"
                );
                Ok(catalog)
            }
            Err(err) => {
                warn!(source = %origin, error = %err, "catalog load failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDefinition, SchemaDefinition};

    struct StaticSource(Result<CatalogDefinition>);

    impl CatalogSource for StaticSource {
        fn load(&self) -> Result<CatalogDefinition> {
            self.0.clone()
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    fn registry_with(result: Result<CatalogDefinition>) -> SchemaRegistry {
        SchemaRegistry::new(Arc::new(StaticSource(result)))
    }

    fn sample_catalog() -> CatalogDefinition {
        let mut default = SchemaDefinition::default();
        default
            .add_table(TableDefinition::new(
                "customers",
                "default/customers",
                vec![ColumnDefinition::new("id", "bigint")],
            ))
            .unwrap();
        let mut catalog = CatalogDefinition::new();
        catalog.add_schema("default", default).unwrap();
        catalog.add_schema("sales", SchemaDefinition::default()).unwrap();
        catalog
    }

    #[test]
    fn test_starts_unloaded() {
        let registry = registry_with(Ok(sample_catalog()));
        assert_eq!(registry.state(), RegistryState::Unloaded);
        registry.schema_names().unwrap();
        assert_eq!(registry.state(), RegistryState::Loaded);
    }

    #[test]
    fn test_schema_names() {
        let registry = registry_with(Ok(sample_catalog()));
        let names = registry.schema_names().unwrap();
        assert_eq!(names, BTreeSet::from(["default".to_string(), "sales".to_string()]));
    }

    #[test]
    fn test_table_names_unknown_schema_is_empty() {
        let registry = registry_with(Ok(sample_catalog()));
        assert!(registry.table_names("ghost").unwrap().is_empty());
        assert_eq!(
            registry.table_names("default").unwrap(),
            BTreeSet::from(["customers".to_string()])
        );
    }

    #[test]
    fn test_table_lookup_miss_is_none() {
        let registry = registry_with(Ok(sample_catalog()));
        assert!(registry.table("default", "orders").unwrap().is_none());
        assert!(registry.table("ghost", "customers").unwrap().is_none());

        let customers = registry.table("default", "customers").unwrap().unwrap();
        assert_eq!(customers.storage_path, "default/customers");
    }

    #[test]
    fn test_failure_is_cached() {
        let registry = registry_with(Err(Error::Parse("bad document".to_string())));
        let first = registry.schema_names().unwrap_err();
        let second = registry.table("default", "customers").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(registry.state(), RegistryState::Failed);

        registry.reset();
        assert_eq!(registry.state(), RegistryState::Unloaded);
    }
}
