//! 成本計算
//!
//! - 持有成本 = Σ 成品 max(庫存水準, 0) × h(n, p) + Σ 原料 max(原料池, 0) × h(n, r)
//! - 缺貨成本 = Σ 成品 max(-庫存水準, 0) × p(n, p)
//! - 在途持有成本 = Σ 本節點送出且期末仍在途的出貨 數量 × h(n, 產品)
//!
//! 每期狀態確定後才計算，各節點之間沒有相依，以 rayon 平行處理。

use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_core::{NodeIndex, Result};

use crate::parameters::RunParameters;
use crate::pipeline::ShipmentPipeline;
use crate::state::NodePeriodState;

/// 單一節點單期的成本
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CostBreakdown {
    pub holding: Decimal,
    pub stockout: Decimal,
    pub in_transit_holding: Decimal,
}

impl CostBreakdown {
    pub fn total(&self) -> Decimal {
        self.holding + self.stockout + self.in_transit_holding
    }
}

/// 成本會計
pub struct CostAccountant<'a> {
    params: &'a RunParameters,
}

impl<'a> CostAccountant<'a> {
    pub fn new(params: &'a RunParameters) -> Self {
        Self { params }
    }

    /// 計算單一節點的成本
    pub fn node_costs(
        &self,
        state: &NodePeriodState,
        pipeline: &ShipmentPipeline,
    ) -> Result<CostBreakdown> {
        let node = state.node;
        let mut costs = CostBreakdown::default();

        for (&product, &level) in &state.inventory_level {
            let params = self.params.product(node, product)?;
            costs.holding += level.max(Decimal::ZERO) * params.holding_cost;
            costs.stockout += (-level).max(Decimal::ZERO) * params.stockout_cost;
        }

        for (&raw_material, &level) in &state.raw_material_inventory {
            costs.holding +=
                level.max(Decimal::ZERO) * self.params.raw_material_holding_cost(node, raw_material);
        }

        for shipment in pipeline.in_transit_from(node, state.period) {
            let params = self.params.product(node, shipment.product)?;
            costs.in_transit_holding += shipment.quantity * params.holding_cost;
        }

        Ok(costs)
    }

    /// 計算一期所有節點的成本並寫回狀態
    pub fn settle_period(
        &self,
        states: &mut BTreeMap<NodeIndex, NodePeriodState>,
        pipeline: &ShipmentPipeline,
    ) -> Result<()> {
        states.par_iter_mut().try_for_each(|(_, state)| {
            let costs = self.node_costs(state, pipeline)?;
            state.holding_cost = costs.holding;
            state.stockout_cost = costs.stockout;
            state.in_transit_holding_cost = costs.in_transit_holding;
            state.total_cost = costs.total();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{d, intro_network};
    use crate::nbom::NetworkBom;
    use crate::pipeline::Shipment;
    use echelon_cache::AttributeCache;
    use echelon_core::{Partner, ProductIndex};

    fn params() -> RunParameters {
        let network = intro_network();
        let nbom = NetworkBom::build(&network).unwrap();
        RunParameters::resolve(&network, &nbom, &mut AttributeCache::new()).unwrap()
    }

    #[test]
    fn test_period_zero_costs_at_upstream_node() {
        let params = params();
        let accountant = CostAccountant::new(&params);

        let mut state = NodePeriodState::new(NodeIndex(2), 0);
        state.inventory_level.insert(ProductIndex(20), d(25));
        state.inventory_level.insert(ProductIndex(30), d(14));
        state.raw_material_inventory.insert(ProductIndex(-5), Decimal::ZERO);

        let mut pipeline = ShipmentPipeline::new();
        for (product, quantity) in [(20, 10), (30, 6)] {
            pipeline.dispatch(Shipment {
                from: Partner::Node(NodeIndex(2)),
                to: NodeIndex(1),
                product: ProductIndex(product),
                quantity: d(quantity),
                shipped: 0,
                arrival: 1,
            });
        }

        let costs = accountant.node_costs(&state, &pipeline).unwrap();
        assert_eq!(costs.holding, d(92));
        assert_eq!(costs.stockout, Decimal::ZERO);
        assert_eq!(costs.in_transit_holding, d(38));
        assert_eq!(costs.total(), d(130));
    }

    #[test]
    fn test_backorder_and_raw_material_holding() {
        let params = params();
        let accountant = CostAccountant::new(&params);

        // 節點 1 第 5 期：原料 20 剩 5/3，庫存水準 -7/3
        let mut state = NodePeriodState::new(NodeIndex(1), 5);
        state.inventory_level.insert(ProductIndex(10), d(-7) / d(3));
        state.raw_material_inventory.insert(ProductIndex(20), d(5) / d(3));
        state.raw_material_inventory.insert(ProductIndex(30), Decimal::ZERO);

        let costs = accountant
            .node_costs(&state, &ShipmentPipeline::new())
            .unwrap();
        assert_eq!(costs.holding, d(5) / d(3) * d(2));
        assert_eq!(costs.stockout, d(7) / d(3) * d(20));
        assert!((costs.total() - d(50)).abs() < Decimal::new(1, 20));
    }

    #[test]
    fn test_settle_period() {
        let params = params();
        let accountant = CostAccountant::new(&params);

        let mut node_1 = NodePeriodState::new(NodeIndex(1), 0);
        node_1.inventory_level.insert(ProductIndex(10), d(4));
        let mut node_2 = NodePeriodState::new(NodeIndex(2), 0);
        node_2.inventory_level.insert(ProductIndex(20), d(25));
        node_2.inventory_level.insert(ProductIndex(30), d(14));
        let mut states = BTreeMap::from([(NodeIndex(1), node_1), (NodeIndex(2), node_2)]);

        accountant
            .settle_period(&mut states, &ShipmentPipeline::new())
            .unwrap();

        assert_eq!(states[&NodeIndex(1)].total_cost, d(20));
        assert_eq!(states[&NodeIndex(2)].holding_cost, d(92));
        assert_eq!(states[&NodeIndex(2)].total_cost, d(92));
    }
}
