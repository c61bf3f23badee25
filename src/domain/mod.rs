pub mod item;
pub mod types;

pub use item::{Item, ScanResult};
pub use types::{CacheEntry, CacheSnapshot, ClassificationCache};
