//! 屬性解析快取
//!
//! 以 (節點, 屬性, 產品) 為鍵記住 `Network::get_attribute` 的結果。
//! 網路的修改版本號改變時整份快取失效；呼叫端也可以只讓單一節點或產品失效。

use std::collections::HashMap;

use echelon_core::{AttributeKey, AttributeValue, Network, NodeIndex, ProductIndex, Result};

use crate::dirty_tracking::DirtyTracker;

type CacheKey = (NodeIndex, AttributeKey, ProductIndex);

/// 快取統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// 屬性解析快取
#[derive(Debug, Default)]
pub struct AttributeCache {
    entries: HashMap<CacheKey, AttributeValue>,
    dirty_nodes: DirtyTracker<NodeIndex>,
    dirty_products: DirtyTracker<ProductIndex>,
    revision: Option<u64>,
    hits: u64,
    misses: u64,
}

impl AttributeCache {
    /// 創建空的快取
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析屬性，命中時直接回傳快取值
    pub fn get(
        &mut self,
        network: &Network,
        node: NodeIndex,
        key: AttributeKey,
        product: ProductIndex,
    ) -> Result<AttributeValue> {
        self.sync(network);

        if let Some(value) = self.entries.get(&(node, key, product)) {
            self.hits += 1;
            return Ok(value.clone());
        }

        self.misses += 1;
        let value = network.get_attribute(node, key, product)?;
        self.entries.insert((node, key, product), value.clone());
        Ok(value)
    }

    /// 標記節點的所有快取值失效
    pub fn invalidate_node(&mut self, node: NodeIndex) {
        self.dirty_nodes.mark_dirty(node);
    }

    /// 標記產品的所有快取值失效
    pub fn invalidate_product(&mut self, product: ProductIndex) {
        self.dirty_products.mark_dirty(product);
    }

    /// 清空快取
    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.dirty_nodes.clear();
        self.dirty_products.clear();
        self.revision = None;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    /// 對齊網路版本並清除髒標記對應的項目
    fn sync(&mut self, network: &Network) {
        if self.revision != Some(network.revision()) {
            if !self.entries.is_empty() {
                tracing::debug!(
                    "網路版本改變 ({:?} -> {})，清空 {} 筆屬性快取",
                    self.revision,
                    network.revision(),
                    self.entries.len()
                );
            }
            self.entries.clear();
            self.dirty_nodes.clear();
            self.dirty_products.clear();
            self.revision = Some(network.revision());
            return;
        }

        if self.dirty_nodes.is_empty() && self.dirty_products.is_empty() {
            return;
        }

        let nodes = &self.dirty_nodes;
        let products = &self.dirty_products;
        self.entries
            .retain(|(node, _, product), _| !nodes.is_dirty(node) && !products.is_dirty(product));
        self.dirty_nodes.clear();
        self.dirty_products.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echelon_core::{Node, Product, SupplyType};
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn network() -> Network {
        let mut network = Network::new();
        network
            .add_node(
                Node::new(NodeIndex(2))
                    .with_supply_type(SupplyType::Unlimited)
                    .with_local_holding_cost(Decimal::from(4)),
            )
            .unwrap();
        network
            .add_product(Product::new(20).with_local_holding_cost(Decimal::from(2)))
            .unwrap();
        network.add_product(Product::new(30)).unwrap();
        network
            .assign_products(NodeIndex(2), [ProductIndex(20), ProductIndex(30)])
            .unwrap();
        network.finalize().unwrap();
        network
    }

    fn holding(cache: &mut AttributeCache, network: &Network, product: i64) -> Decimal {
        cache
            .get(
                network,
                NodeIndex(2),
                AttributeKey::LocalHoldingCost,
                ProductIndex(product),
            )
            .unwrap()
            .as_amount()
            .unwrap()
    }

    #[test]
    fn test_cache_hit() {
        let network = network();
        let mut cache = AttributeCache::new();

        assert_eq!(holding(&mut cache, &network, 20), Decimal::from(2));
        assert_eq!(holding(&mut cache, &network, 20), Decimal::from(2));
        assert_eq!(holding(&mut cache, &network, 30), Decimal::from(4));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.entries, 2);
    }

    #[rstest]
    #[case::product_value(AttributeKey::LocalHoldingCost, 20, Decimal::from(2))]
    #[case::node_scalar(AttributeKey::LocalHoldingCost, 30, Decimal::from(4))]
    #[case::default_value(AttributeKey::StockoutCost, 20, Decimal::ZERO)]
    fn test_lookup_through_cache(
        #[case] key: AttributeKey,
        #[case] product: i64,
        #[case] expected: Decimal,
    ) {
        let network = network();
        let mut cache = AttributeCache::new();

        for _ in 0..2 {
            let value = cache
                .get(&network, NodeIndex(2), key, ProductIndex(product))
                .unwrap();
            assert_eq!(value.as_amount(), Some(expected));
        }
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_revision_change_invalidates() {
        let mut network = network();
        let mut cache = AttributeCache::new();
        assert_eq!(holding(&mut cache, &network, 20), Decimal::from(2));

        if let Some(product) = network.product_mut(ProductIndex(20)) {
            product.attributes.local_holding_cost = Some(Decimal::from(9));
        }

        assert_eq!(holding(&mut cache, &network, 20), Decimal::from(9));
    }

    #[test]
    fn test_invalidate_product_only() {
        let network = network();
        let mut cache = AttributeCache::new();
        holding(&mut cache, &network, 20);
        holding(&mut cache, &network, 30);

        cache.invalidate_product(ProductIndex(20));
        holding(&mut cache, &network, 30);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().entries, 1);

        holding(&mut cache, &network, 20);
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn test_invalidate_node() {
        let network = network();
        let mut cache = AttributeCache::new();
        holding(&mut cache, &network, 20);
        cache.invalidate_node(NodeIndex(2));
        holding(&mut cache, &network, 30);

        assert_eq!(cache.stats().entries, 1);
        cache.invalidate_all();
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_error_is_not_cached() {
        let network = network();
        let mut cache = AttributeCache::new();

        assert!(cache
            .get(
                &network,
                NodeIndex(2),
                AttributeKey::InventoryPolicy,
                ProductIndex(20)
            )
            .is_err());
        assert_eq!(cache.stats().entries, 0);
    }
}
