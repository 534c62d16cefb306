//! Spatial indexing for positions and posts.

pub mod index;
pub mod sharded;

pub use index::{GeoIndex, IndexHit, IndexStats};
pub use sharded::ShardedGeoIndex;
