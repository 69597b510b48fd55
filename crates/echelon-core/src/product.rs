//! 產品模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::demand::DemandSource;
use crate::policy::Policy;

/// 產品索引
///
/// 正數由使用者宣告，負數保留給自動產生的虛擬產品。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProductIndex(pub i64);

impl ProductIndex {
    /// 是否為虛擬產品
    pub fn is_dummy(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for ProductIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for ProductIndex {
    fn from(index: i32) -> Self {
        Self(i64::from(index))
    }
}

impl From<i64> for ProductIndex {
    fn from(index: i64) -> Self {
        Self(index)
    }
}

/// 產品層級的屬性覆寫
///
/// `None` 表示未設定，解析時會退回節點層級。
#[derive(Debug, Clone, Default)]
pub struct ProductAttributes {
    pub local_holding_cost: Option<Decimal>,
    pub stockout_cost: Option<Decimal>,
    pub shipment_lead_time: Option<u32>,
    pub inventory_policy: Option<Policy>,
    pub initial_inventory_level: Option<Decimal>,
    pub demand_source: Option<DemandSource>,
}

/// 產品
#[derive(Debug, Clone)]
pub struct Product {
    /// 產品索引
    pub index: ProductIndex,

    /// 名稱
    pub name: Option<String>,

    /// 屬性覆寫
    pub attributes: ProductAttributes,
}

impl Product {
    /// 創建新的產品
    pub fn new(index: impl Into<ProductIndex>) -> Self {
        Self {
            index: index.into(),
            name: None,
            attributes: ProductAttributes::default(),
        }
    }

    /// 創建虛擬產品
    pub(crate) fn dummy(index: ProductIndex, name: String) -> Self {
        debug_assert!(index.is_dummy());
        Self {
            index,
            name: Some(name),
            attributes: ProductAttributes::default(),
        }
    }

    /// 建構器模式：設置名稱
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 建構器模式：設置持有成本
    pub fn with_local_holding_cost(mut self, cost: Decimal) -> Self {
        self.attributes.local_holding_cost = Some(cost);
        self
    }

    /// 建構器模式：設置缺貨成本
    pub fn with_stockout_cost(mut self, cost: Decimal) -> Self {
        self.attributes.stockout_cost = Some(cost);
        self
    }

    /// 建構器模式：設置運送提前期
    pub fn with_shipment_lead_time(mut self, periods: u32) -> Self {
        self.attributes.shipment_lead_time = Some(periods);
        self
    }

    /// 建構器模式：設置庫存政策
    pub fn with_inventory_policy(mut self, policy: Policy) -> Self {
        self.attributes.inventory_policy = Some(policy);
        self
    }

    /// 建構器模式：設置初始庫存水準
    pub fn with_initial_inventory_level(mut self, level: Decimal) -> Self {
        self.attributes.initial_inventory_level = Some(level);
        self
    }

    /// 建構器模式：設置外部需求來源
    pub fn with_demand_source(mut self, source: DemandSource) -> Self {
        self.attributes.demand_source = Some(source);
        self
    }

    pub fn is_dummy(&self) -> bool {
        self.index.is_dummy()
    }
}
