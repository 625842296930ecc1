//! Asset identity: normalization, inventories, cache, existence, mapping.

pub mod cache;
pub mod existence;
pub mod filename;
pub mod inventory;
pub mod mapper;

pub use cache::AssetCache;
pub use existence::all_exist_at_destination;
pub use filename::{normalize, remote_key, split_extension, FilenameParts};
pub use inventory::{Asset, InventoryPage};
pub use mapper::{build_mapping, IdMapping, MappingStats, MappingTable};
