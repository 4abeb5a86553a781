//! File connector
//!
//! Resolves catalog metadata from `<file.location>/metadata.json` and plans
//! splits by listing each table's storage directory.
//!
//! # Example
//! ```no_run
//! use floe_common::Settings;
//! use floe_connector_file::{FileConnector, TableHandle};
//!
//! let connector = FileConnector::new(&Settings::from_location("/srv/data"))?;
//! let splits = connector
//!     .split_manager()
//!     .get_splits(&TableHandle::new("default", "orders"))?;
//! println!("{} splits", splits.len());
//! # Ok::<(), floe_common::Error>(())
//! ```

pub mod connector;
pub mod loader;
pub mod model;
pub mod planner;
pub mod registry;
pub mod split;
pub mod split_manager;

pub use connector::FileConnector;
pub use loader::{CatalogSource, MetadataCatalogLoader};
pub use model::{CatalogDefinition, ColumnDefinition, SchemaDefinition, TableDefinition};
pub use planner::SplitPlanner;
pub use registry::{RegistryState, SchemaRegistry};
pub use split::{LineRange, Split};
pub use split_manager::{SplitManager, TableHandle};
