//! 屬性解析
//!
//! 可設定的屬性可以存在三個層級：(節點, 產品) 覆寫、產品本身、節點純量。
//! 解析順序固定為：
//! 1. 節點屬性為逐產品對照表且包含該產品
//! 2. 產品本身有明確設定
//! 3. 節點屬性為純量

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fmt;

use crate::demand::DemandSource;
use crate::policy::Policy;
use crate::product::ProductIndex;

/// 節點層級的屬性值
#[derive(Debug, Clone)]
pub enum NodeAttribute<T> {
    /// 未設定
    Unset,

    /// 套用於節點上所有產品
    Scalar(T),

    /// (節點, 產品) 專屬值
    PerProduct(BTreeMap<ProductIndex, T>),
}

impl<T> Default for NodeAttribute<T> {
    fn default() -> Self {
        NodeAttribute::Unset
    }
}

impl<T> NodeAttribute<T> {
    /// 由 (產品, 值) 對建立逐產品屬性
    pub fn per_product<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<ProductIndex>,
    {
        NodeAttribute::PerProduct(values.into_iter().map(|(p, v)| (p.into(), v)).collect())
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, NodeAttribute::Unset)
    }

    /// 逐產品對照表中出現的產品
    pub fn overridden_products(&self) -> Vec<ProductIndex> {
        match self {
            NodeAttribute::PerProduct(values) => values.keys().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// 設定單一產品的值
    ///
    /// 原本為純量時，純量不再適用；需要保留純量時請改在產品層級設定。
    pub fn set_for_product(&mut self, product: ProductIndex, value: T) {
        match self {
            NodeAttribute::PerProduct(values) => {
                values.insert(product, value);
            }
            _ => {
                *self = NodeAttribute::PerProduct(BTreeMap::from([(product, value)]));
            }
        }
    }
}

/// 依三層優先順序解析屬性
pub fn resolve<'a, T>(
    node_value: &'a NodeAttribute<T>,
    product_value: Option<&'a T>,
    product: ProductIndex,
) -> Option<&'a T> {
    if let NodeAttribute::PerProduct(values) = node_value {
        if let Some(value) = values.get(&product) {
            return Some(value);
        }
    }

    if let Some(value) = product_value {
        return Some(value);
    }

    match node_value {
        NodeAttribute::Scalar(value) => Some(value),
        _ => None,
    }
}

/// 屬性名稱
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributeKey {
    LocalHoldingCost,
    StockoutCost,
    ShipmentLeadTime,
    InventoryPolicy,
    InitialInventoryLevel,
    DemandSource,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 6] = [
        AttributeKey::LocalHoldingCost,
        AttributeKey::StockoutCost,
        AttributeKey::ShipmentLeadTime,
        AttributeKey::InventoryPolicy,
        AttributeKey::InitialInventoryLevel,
        AttributeKey::DemandSource,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AttributeKey::LocalHoldingCost => "local_holding_cost",
            AttributeKey::StockoutCost => "stockout_cost",
            AttributeKey::ShipmentLeadTime => "shipment_lead_time",
            AttributeKey::InventoryPolicy => "inventory_policy",
            AttributeKey::InitialInventoryLevel => "initial_inventory_level",
            AttributeKey::DemandSource => "demand_source",
        }
    }

    /// 系統預設值
    ///
    /// 庫存政策沒有預設值；初始庫存水準的預設值取決於政策，由引擎推導。
    pub fn default_value(&self) -> Option<AttributeValue> {
        match self {
            AttributeKey::LocalHoldingCost | AttributeKey::StockoutCost => {
                Some(AttributeValue::Amount(Decimal::ZERO))
            }
            AttributeKey::ShipmentLeadTime => Some(AttributeValue::Periods(0)),
            AttributeKey::DemandSource => Some(AttributeValue::NoDemand),
            AttributeKey::InventoryPolicy | AttributeKey::InitialInventoryLevel => None,
        }
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 解析後的屬性值
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// 成本率或數量
    Amount(Decimal),

    /// 期數
    Periods(u32),

    Policy(Policy),

    Demand(DemandSource),

    /// 沒有外部顧客
    NoDemand,
}

impl AttributeValue {
    pub fn as_amount(&self) -> Option<Decimal> {
        match self {
            AttributeValue::Amount(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_periods(&self) -> Option<u32> {
        match self {
            AttributeValue::Periods(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_policy(&self) -> Option<&Policy> {
        match self {
            AttributeValue::Policy(policy) => Some(policy),
            _ => None,
        }
    }

    pub fn as_demand(&self) -> Option<&DemandSource> {
        match self {
            AttributeValue::Demand(source) => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_product_takes_precedence() {
        let node_value = NodeAttribute::per_product([(20, Decimal::from(7))]);
        let product_value = Decimal::from(2);

        assert_eq!(
            resolve(&node_value, Some(&product_value), ProductIndex(20)),
            Some(&Decimal::from(7))
        );
    }

    #[test]
    fn test_product_before_node_scalar() {
        let node_value = NodeAttribute::Scalar(Decimal::from(5));
        let product_value = Decimal::from(2);

        assert_eq!(
            resolve(&node_value, Some(&product_value), ProductIndex(20)),
            Some(&Decimal::from(2))
        );
        assert_eq!(
            resolve(&node_value, None, ProductIndex(20)),
            Some(&Decimal::from(5))
        );
    }

    #[test]
    fn test_per_product_without_entry_falls_through() {
        let node_value = NodeAttribute::per_product([(20, 1u32)]);

        assert_eq!(resolve(&node_value, Some(&4), ProductIndex(30)), Some(&4));
        // 逐產品對照表沒有純量可退回
        assert_eq!(resolve(&node_value, None, ProductIndex(30)), None);
    }

    #[test]
    fn test_unset_resolves_to_none() {
        let node_value: NodeAttribute<u32> = NodeAttribute::Unset;
        assert_eq!(resolve(&node_value, None, ProductIndex(1)), None);
        assert!(!node_value.is_set());
    }

    #[test]
    fn test_set_for_product() {
        let mut value = NodeAttribute::Scalar(1u32);
        value.set_for_product(ProductIndex(10), 3);

        assert_eq!(value.overridden_products(), vec![ProductIndex(10)]);
        assert_eq!(resolve(&value, None, ProductIndex(10)), Some(&3));
    }

    #[test]
    fn test_default_values() {
        assert_eq!(
            AttributeKey::LocalHoldingCost
                .default_value()
                .and_then(|v| v.as_amount()),
            Some(Decimal::ZERO)
        );
        assert_eq!(
            AttributeKey::ShipmentLeadTime
                .default_value()
                .and_then(|v| v.as_periods()),
            Some(0)
        );
        assert!(AttributeKey::InventoryPolicy.default_value().is_none());
        assert_eq!(AttributeKey::StockoutCost.to_string(), "stockout_cost");
    }
}
