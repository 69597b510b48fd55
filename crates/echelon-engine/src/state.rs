//! 每期狀態與模擬歷史
//!
//! 歷史記錄以 (期間, 節點) 為索引，每期結束後不再改變。

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use echelon_core::{NodeIndex, Partner, ProductIndex};

/// 流向鍵：對象與產品
///
/// 序列化為 `"EXT|10"`、`"2|20"` 形式的字串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlowKey {
    pub partner: Partner,
    pub product: ProductIndex,
}

impl FlowKey {
    pub fn new(partner: Partner, product: ProductIndex) -> Self {
        Self { partner, product }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.partner, self.product)
    }
}

impl Serialize for FlowKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 單一節點在單一期間的狀態
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePeriodState {
    pub node: NodeIndex,
    pub period: usize,

    /// 進貨訂單：(下單方, 成品) -> 數量
    pub inbound_order: BTreeMap<FlowKey, Decimal>,

    /// 成品訂購量
    pub order_quantity: BTreeMap<ProductIndex, Decimal>,

    /// 原料訂單：(供應商, 原料) -> 數量
    pub raw_material_order: BTreeMap<FlowKey, Decimal>,

    /// 到貨：(供應商, 原料) -> 數量
    pub inbound_shipment: BTreeMap<FlowKey, Decimal>,

    /// 本期領用的原料
    pub raw_material_consumed: BTreeMap<ProductIndex, Decimal>,

    /// 期末原料庫存
    pub raw_material_inventory: BTreeMap<ProductIndex, Decimal>,

    /// 本期產量
    pub production: BTreeMap<ProductIndex, Decimal>,

    /// 期末待生產成品
    pub pending_finished_goods: BTreeMap<ProductIndex, Decimal>,

    /// 出貨：(下單方, 成品) -> 數量
    pub outbound_shipment: BTreeMap<FlowKey, Decimal>,

    /// 期末現有庫存
    pub on_hand: BTreeMap<ProductIndex, Decimal>,

    /// 期末欠貨：(下單方, 成品) -> 數量
    pub backorder: BTreeMap<FlowKey, Decimal>,

    /// 期末庫存水準（負值為欠貨）
    pub inventory_level: BTreeMap<ProductIndex, Decimal>,

    pub holding_cost: Decimal,
    pub stockout_cost: Decimal,
    pub in_transit_holding_cost: Decimal,
    pub total_cost: Decimal,
}

impl NodePeriodState {
    pub fn new(node: NodeIndex, period: usize) -> Self {
        Self {
            node,
            period,
            inbound_order: BTreeMap::new(),
            order_quantity: BTreeMap::new(),
            raw_material_order: BTreeMap::new(),
            inbound_shipment: BTreeMap::new(),
            raw_material_consumed: BTreeMap::new(),
            raw_material_inventory: BTreeMap::new(),
            production: BTreeMap::new(),
            pending_finished_goods: BTreeMap::new(),
            outbound_shipment: BTreeMap::new(),
            on_hand: BTreeMap::new(),
            backorder: BTreeMap::new(),
            inventory_level: BTreeMap::new(),
            holding_cost: Decimal::ZERO,
            stockout_cost: Decimal::ZERO,
            in_transit_holding_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
        }
    }

    /// 某成品本期的進貨訂單總量
    pub fn total_inbound_order(&self, product: ProductIndex) -> Decimal {
        self.inbound_order
            .iter()
            .filter(|(key, _)| key.product == product)
            .map(|(_, quantity)| *quantity)
            .sum()
    }

    /// 某成品本期的出貨總量
    pub fn total_outbound_shipment(&self, product: ProductIndex) -> Decimal {
        self.outbound_shipment
            .iter()
            .filter(|(key, _)| key.product == product)
            .map(|(_, quantity)| *quantity)
            .sum()
    }

    /// 某原料本期的到貨總量
    pub fn total_inbound_shipment(&self, raw_material: ProductIndex) -> Decimal {
        self.inbound_shipment
            .iter()
            .filter(|(key, _)| key.product == raw_material)
            .map(|(_, quantity)| *quantity)
            .sum()
    }

    pub fn inventory_level(&self, product: ProductIndex) -> Decimal {
        value_or_zero(&self.inventory_level, product)
    }

    pub fn raw_material_inventory(&self, raw_material: ProductIndex) -> Decimal {
        value_or_zero(&self.raw_material_inventory, raw_material)
    }

    pub fn production(&self, product: ProductIndex) -> Decimal {
        value_or_zero(&self.production, product)
    }

    pub fn order_quantity(&self, product: ProductIndex) -> Decimal {
        value_or_zero(&self.order_quantity, product)
    }

    pub(crate) fn add_inbound_order(&mut self, requester: Partner, product: ProductIndex, quantity: Decimal) {
        *self
            .inbound_order
            .entry(FlowKey::new(requester, product))
            .or_insert(Decimal::ZERO) += quantity;
    }
}

fn value_or_zero(map: &BTreeMap<ProductIndex, Decimal>, key: ProductIndex) -> Decimal {
    map.get(&key).copied().unwrap_or(Decimal::ZERO)
}

/// 整次模擬的狀態歷史
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationHistory {
    periods: Vec<BTreeMap<NodeIndex, NodePeriodState>>,
}

impl SimulationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, states: BTreeMap<NodeIndex, NodePeriodState>) {
        self.periods.push(states);
    }

    /// 已模擬的期數
    pub fn num_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn state(&self, node: NodeIndex, period: usize) -> Option<&NodePeriodState> {
        self.periods.get(period).and_then(|states| states.get(&node))
    }

    /// 某期所有節點的狀態
    pub fn period(&self, period: usize) -> Option<&BTreeMap<NodeIndex, NodePeriodState>> {
        self.periods.get(period)
    }

    /// 某節點各期的狀態
    pub fn node_states(&self, node: NodeIndex) -> impl Iterator<Item = &NodePeriodState> {
        self.periods.iter().filter_map(move |states| states.get(&node))
    }

    pub fn node_total_cost(&self, node: NodeIndex) -> Decimal {
        self.node_states(node).map(|s| s.total_cost).sum()
    }

    pub fn period_total_cost(&self, period: usize) -> Decimal {
        self.periods
            .get(period)
            .map(|states| states.values().map(|s| s.total_cost).sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// 所有節點、所有期間的總成本
    pub fn total_cost(&self) -> Decimal {
        (0..self.periods.len())
            .map(|period| self.period_total_cost(period))
            .sum()
    }
}
