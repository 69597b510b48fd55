//! 原料池
//!
//! 原料庫存只以 (節點, 原料) 為鍵：不同供應商送來的同一原料合併計算，
//! 節點上所有使用該原料的產品也共用同一個數量。

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_core::{NodeIndex, ProductIndex};

/// 原料池
#[derive(Debug, Clone, Default)]
pub struct RawMaterialPool {
    levels: BTreeMap<(NodeIndex, ProductIndex), Decimal>,
}

impl RawMaterialPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 收料
    pub fn receive(&mut self, node: NodeIndex, raw_material: ProductIndex, quantity: Decimal) {
        *self
            .levels
            .entry((node, raw_material))
            .or_insert(Decimal::ZERO) += quantity;
    }

    /// 領料，回傳實際扣除的數量
    ///
    /// 扣除量不超過池中現有數量，十進位捨入的殘差不會讓原料池變成負數。
    pub fn consume(&mut self, node: NodeIndex, raw_material: ProductIndex, quantity: Decimal) -> Decimal {
        let level = self
            .levels
            .entry((node, raw_material))
            .or_insert(Decimal::ZERO);
        let consumed = quantity.min(*level).max(Decimal::ZERO);
        *level -= consumed;
        consumed
    }

    /// 目前數量
    pub fn level(&self, node: NodeIndex, raw_material: ProductIndex) -> Decimal {
        self.levels
            .get(&(node, raw_material))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// 節點上所有原料的數量
    pub fn levels_at(&self, node: NodeIndex) -> BTreeMap<ProductIndex, Decimal> {
        self.levels
            .range((node, ProductIndex(i64::MIN))..=(node, ProductIndex(i64::MAX)))
            .map(|(&(_, raw_material), &level)| (raw_material, level))
            .collect()
    }
}
