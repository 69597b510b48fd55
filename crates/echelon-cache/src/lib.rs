//! # Echelon Cache
//!
//! 屬性解析快取與失效追蹤

pub mod attribute_cache;
pub mod dirty_tracking;

// Re-export 主要類型
pub use attribute_cache::{AttributeCache, CacheStats};
pub use dirty_tracking::DirtyTracker;
