//! 髒標記追蹤

use std::collections::HashSet;
use std::hash::Hash;

/// 髒標記追蹤器
#[derive(Debug, Clone)]
pub struct DirtyTracker<K> {
    dirty: HashSet<K>,
}

impl<K: Eq + Hash + Clone> DirtyTracker<K> {
    /// 創建新的追蹤器
    pub fn new() -> Self {
        Self {
            dirty: HashSet::new(),
        }
    }

    /// 標記為髒
    pub fn mark_dirty(&mut self, key: K) {
        self.dirty.insert(key);
    }

    /// 檢查是否為髒
    pub fn is_dirty(&self, key: &K) -> bool {
        self.dirty.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    /// 清除所有髒標記
    pub fn clear(&mut self) {
        self.dirty.clear();
    }
}

impl<K: Eq + Hash + Clone> Default for DirtyTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}
