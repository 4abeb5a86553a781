use std::fmt;
use std::sync::Arc;

use floe_common::{Error, Result};

use crate::planner::SplitPlanner;
use crate::registry::SchemaRegistry;
use crate::split::Split;

/// Identifies a table in a planning request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableHandle {
    pub schema_name: String,
    pub table_name: String,
}

impl TableHandle {
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

/// Resolves a table handle through the registry and plans its splits.
pub struct SplitManager {
    registry: Arc<SchemaRegistry>,
    planner: SplitPlanner,
}

impl SplitManager {
    pub fn new(registry: Arc<SchemaRegistry>, planner: SplitPlanner) -> Self {
        Self { registry, planner }
    }

    pub fn planner(&self) -> &SplitPlanner {
        &self.planner
    }

    /// Fails with `NotFound` if the handle no longer resolves to a table.
    pub fn get_splits(&self, handle: &TableHandle) -> Result<Vec<Split>> {
        let table = self
            .registry
            .table(&handle.schema_name, &handle.table_name)?
            .ok_or_else(|| Error::NotFound(format!("table {handle} does not exist")))?;
        self.planner.plan(&table)
    }
}
