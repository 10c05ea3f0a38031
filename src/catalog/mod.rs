pub mod backend;
mod migrations;
mod postgres_manager;
mod sqlite_manager;

mod manager;

pub use backend::CatalogConflict;
pub use manager::{BrandInfo, CatalogManager, CategoryInfo, EquipmentUnitInfo, SequenceRecord};
pub use migrations::DEFAULT_BRANDS;
pub use postgres_manager::PostgresCatalogManager;
pub use sqlite_manager::SqliteCatalogManager;
