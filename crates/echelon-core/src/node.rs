//! 節點模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::attribute::NodeAttribute;
use crate::demand::DemandSource;
use crate::policy::Policy;
use crate::product::ProductIndex;

/// 節點索引
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    /// 節點本身的虛擬產品索引
    pub fn dummy_product(&self) -> ProductIndex {
        ProductIndex(-(2 * i64::from(self.0) + 2))
    }

    /// 節點外部供應商的虛擬產品索引
    pub fn external_supplier_product(&self) -> ProductIndex {
        ProductIndex(-(2 * i64::from(self.0) + 1))
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 訂單或出貨的對象
///
/// `External` 代表網路外的顧客或供應商，排序在所有節點之前。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Partner {
    External,
    Node(NodeIndex),
}

impl Partner {
    pub fn node(&self) -> Option<NodeIndex> {
        match self {
            Partner::External => None,
            Partner::Node(index) => Some(*index),
        }
    }
}

impl From<NodeIndex> for Partner {
    fn from(index: NodeIndex) -> Self {
        Partner::Node(index)
    }
}

impl fmt::Display for Partner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partner::External => f.write_str("EXT"),
            Partner::Node(index) => write!(f, "{}", index),
        }
    }
}

/// 供應類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupplyType {
    /// 只從上游節點取得原料
    #[default]
    None,
    /// 無限量外部供應
    Unlimited,
}

/// 節點層級的屬性
#[derive(Debug, Clone, Default)]
pub struct NodeAttributes {
    pub local_holding_cost: NodeAttribute<Decimal>,
    pub stockout_cost: NodeAttribute<Decimal>,
    pub shipment_lead_time: NodeAttribute<u32>,
    pub inventory_policy: NodeAttribute<Policy>,
    pub initial_inventory_level: NodeAttribute<Decimal>,
    pub demand_source: NodeAttribute<DemandSource>,
}

/// 供應鏈節點
#[derive(Debug, Clone)]
pub struct Node {
    /// 節點索引
    pub index: NodeIndex,

    /// 名稱
    pub name: Option<String>,

    /// 供應類型
    pub supply_type: SupplyType,

    /// 屬性
    pub attributes: NodeAttributes,

    pub(crate) predecessors: BTreeSet<NodeIndex>,
    pub(crate) successors: BTreeSet<NodeIndex>,
    pub(crate) products: BTreeSet<ProductIndex>,
}

impl Node {
    /// 創建新的節點
    pub fn new(index: NodeIndex) -> Self {
        Self {
            index,
            name: None,
            supply_type: SupplyType::None,
            attributes: NodeAttributes::default(),
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
            products: BTreeSet::new(),
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 建構器模式：設置供應類型
    pub fn with_supply_type(mut self, supply_type: SupplyType) -> Self {
        self.supply_type = supply_type;
        self
    }

    /// 建構器模式：設置持有成本（節點純量）
    pub fn with_local_holding_cost(mut self, cost: Decimal) -> Self {
        self.attributes.local_holding_cost = NodeAttribute::Scalar(cost);
        self
    }

    /// 建構器模式：設置缺貨成本（節點純量）
    pub fn with_stockout_cost(mut self, cost: Decimal) -> Self {
        self.attributes.stockout_cost = NodeAttribute::Scalar(cost);
        self
    }

    /// 建構器模式：設置運送提前期（節點純量）
    pub fn with_shipment_lead_time(mut self, periods: u32) -> Self {
        self.attributes.shipment_lead_time = NodeAttribute::Scalar(periods);
        self
    }

    /// 建構器模式：設置庫存政策（節點純量）
    pub fn with_inventory_policy(mut self, policy: Policy) -> Self {
        self.attributes.inventory_policy = NodeAttribute::Scalar(policy);
        self
    }

    /// 建構器模式：設置外部需求來源（節點純量）
    pub fn with_demand_source(mut self, source: DemandSource) -> Self {
        self.attributes.demand_source = NodeAttribute::Scalar(source);
        self
    }

    pub fn is_external_supply(&self) -> bool {
        self.supply_type == SupplyType::Unlimited
    }

    /// 處理的產品（索引遞增）
    pub fn products(&self) -> impl Iterator<Item = ProductIndex> + '_ {
        self.products.iter().copied()
    }

    pub fn handles(&self, product: ProductIndex) -> bool {
        self.products.contains(&product)
    }

    pub fn predecessors(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.predecessors.iter().copied()
    }

    pub fn successors(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.successors.iter().copied()
    }

    /// 供應此節點的對象：外部供應商（若有）與上游節點
    pub fn suppliers(&self) -> Vec<Partner> {
        let mut suppliers = Vec::with_capacity(self.predecessors.len() + 1);
        if self.is_external_supply() {
            suppliers.push(Partner::External);
        }
        suppliers.extend(self.predecessors.iter().copied().map(Partner::Node));
        suppliers
    }

    pub fn is_source(&self) -> bool {
        self.predecessors.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.successors.is_empty()
    }
}
