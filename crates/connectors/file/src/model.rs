//! In-memory catalog model: schema → table → column.
//!
//! Mirrors the layout of `metadata.json`:
//!
//! ```json
//! { "default": { "tables": { "orders": {
//!     "name": "orders", "path": "default/orders",
//!     "columns": [ { "name": "id", "type": "bigint" } ] } } } }
//! ```

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use floe_common::{Error, Result};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    /// Directory holding the table's files; relative paths resolve against `file.location`.
    #[serde(rename = "path")]
    pub storage_path: String,
    /// Physical column order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(
        name: impl Into<String>,
        storage_path: impl Into<String>,
        columns: Vec<ColumnDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            storage_path: storage_path.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    #[serde(deserialize_with = "unique_map")]
    pub tables: BTreeMap<String, TableDefinition>,
}

impl SchemaDefinition {
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn add_table(&mut self, table: TableDefinition) -> Result<()> {
        match self.tables.entry(table.name.clone()) {
            Entry::Occupied(_) => Err(Error::Parse(format!(
                "duplicate table `{}`",
                table.name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(table);
                Ok(())
            }
        }
    }
}

/// The full parsed catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CatalogDefinition {
    schemas: BTreeMap<String, SchemaDefinition>,
}

impl<'de> Deserialize<'de> for CatalogDefinition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        unique_map(deserializer).map(|schemas| CatalogDefinition { schemas })
    }
}

impl CatalogDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a catalog document and checks its structural rules.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: CatalogDefinition = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn add_schema(&mut self, name: impl Into<String>, schema: SchemaDefinition) -> Result<()> {
        match self.schemas.entry(name.into()) {
            Entry::Occupied(slot) => Err(Error::Parse(format!(
                "duplicate schema `{}`",
                slot.key()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(schema);
                Ok(())
            }
        }
    }

    pub fn schema_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaDefinition> {
        self.schemas.get(name)
    }

    pub fn table(&self, schema_name: &str, table_name: &str) -> Option<&TableDefinition> {
        self.schema(schema_name).and_then(|s| s.table(table_name))
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn table_count(&self) -> usize {
        self.schemas.values().map(|s| s.tables.len()).sum()
    }

    /// Checks the rules the document shape alone cannot express.
    pub fn validate(&self) -> Result<()> {
        for (schema_name, schema) in &self.schemas {
            if schema_name.is_empty() {
                return Err(Error::Parse("schema name must not be empty".to_string()));
            }
            for (table_key, table) in &schema.tables {
                if table_key.is_empty() {
                    return Err(Error::Parse(format!(
                        "schema `{schema_name}` has a table with an empty name"
                    )));
                }
                if table.name != *table_key {
                    return Err(Error::Parse(format!(
                        "table `{schema_name}.{table_key}` declares mismatched name `{}`",
                        table.name
                    )));
                }
                if let Some(position) = table.columns.iter().position(|c| c.name.is_empty()) {
                    return Err(Error::Parse(format!(
                        "column {position} of `{schema_name}.{table_key}` has an empty name"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Deserializes a JSON object into a map, rejecting repeated keys.
fn unique_map<'de, D, V>(deserializer: D) -> std::result::Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueMapVisitor<V>(PhantomData<V>);

    impl<'de, V> Visitor<'de> for UniqueMapVisitor<V>
    where
        V: Deserialize<'de>,
    {
        type Value = BTreeMap<String, V>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an object with unique keys")
        }

        fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                match map.entry(key) {
                    Entry::Occupied(slot) => {
                        return Err(de::Error::custom(format_args!(
                            "duplicate key `{}`",
                            slot.key()
                        )));
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
}
