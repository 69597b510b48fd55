//! 模擬主迴圈
//!
//! 每期分兩輪走訪網路：
//! 1. 由下游到上游：實現外部需求、計算庫存位置與訂購量、把原料訂單送到供應商
//! 2. 由上游到下游：收料、生產、出貨並更新庫存水準
//!
//! 兩輪完成後計算各節點成本，下一期才開始。

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_cache::AttributeCache;
use echelon_core::{
    Network, NodeIndex, Partner, ProductIndex, Result, SimError, SimulationConfig,
};

use crate::cost::CostAccountant;
use crate::nbom::NetworkBom;
use crate::ordering::OrderPlanner;
use crate::parameters::RunParameters;
use crate::pipeline::{Shipment, ShipmentPipeline};
use crate::pool::RawMaterialPool;
use crate::production::{ProductionPlanner, ProductionRequest};
use crate::shipping::FinishedGoods;
use crate::state::{FlowKey, NodePeriodState, SimulationHistory};
use crate::{SimWarning, SimulationResult};

/// 模擬器
///
/// 建立時完成網路的虛擬產品產生、驗證、NBOM 與參數解析；
/// 任何組態錯誤都在此回報，`run` 不會模擬到一半才失敗。
#[derive(Debug)]
pub struct Simulator {
    network: Network,
    config: SimulationConfig,
    nbom: NetworkBom,
    params: RunParameters,
    order: Vec<NodeIndex>,
    warnings: Vec<SimWarning>,
}

/// 跨期的執行狀態
struct RunState {
    finished: BTreeMap<(NodeIndex, ProductIndex), FinishedGoods>,
    pool: RawMaterialPool,
    pipeline: ShipmentPipeline,
}

impl Simulator {
    /// 創建模擬器
    pub fn new(mut network: Network, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        network.finalize()?;

        let order = network.topological_order()?;
        let nbom = NetworkBom::build(&network)?;
        let mut cache = AttributeCache::new();
        let params = RunParameters::resolve(&network, &nbom, &mut cache)?;
        let warnings = Self::collect_warnings(&network, &nbom, &config);

        for warning in &warnings {
            tracing::warn!("節點 {}: {}", warning.node, warning.message);
        }

        Ok(Self {
            network,
            config,
            nbom,
            params,
            order,
            warnings,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn network_bom(&self) -> &NetworkBom {
        &self.nbom
    }

    pub fn parameters(&self) -> &RunParameters {
        &self.params
    }

    /// 上游到下游的節點順序
    pub fn topological_order(&self) -> &[NodeIndex] {
        &self.order
    }

    pub fn warnings(&self) -> &[SimWarning] {
        &self.warnings
    }

    /// 執行模擬
    pub fn run(&self) -> Result<SimulationResult> {
        tracing::info!(
            "開始模擬：節點 {} 個，期數 {}",
            self.network.node_count(),
            self.config.num_periods
        );
        let start_time = std::time::Instant::now();

        let mut run = self.initial_state()?;
        let mut history = SimulationHistory::new();
        let accountant = CostAccountant::new(&self.params);

        for period in 0..self.config.num_periods {
            let mut states: BTreeMap<NodeIndex, NodePeriodState> = self
                .order
                .iter()
                .map(|&node| (node, NodePeriodState::new(node, period)))
                .collect();

            tracing::debug!("第 {} 期：需求與訂單傳遞", period);
            for &node in self.order.iter().rev() {
                self.place_orders(node, period, &mut run, &mut states)?;
            }

            tracing::debug!("第 {} 期：收料、生產與出貨", period);
            for &node in &self.order {
                let state = states.get_mut(&node).ok_or(SimError::NodeNotFound(node))?;
                Self::receive(node, period, &mut run, state);
                self.produce(node, &mut run, state)?;
                self.ship(node, period, &mut run, state)?;
            }

            accountant.settle_period(&mut states, &run.pipeline)?;
            history.push(states);
        }

        let total_cost = history.total_cost();
        let mut result = SimulationResult {
            history,
            total_cost,
            warnings: Vec::new(),
            calculation_time_ms: Some(start_time.elapsed().as_millis()),
        };
        for warning in &self.warnings {
            result.add_warning(warning.clone());
        }

        tracing::info!("模擬完成，耗時 {:?}", start_time.elapsed());
        tracing::info!("總成本: {}", total_cost);

        Ok(result)
    }

    /// 執行前即可判斷的警告
    fn collect_warnings(
        network: &Network,
        nbom: &NetworkBom,
        config: &SimulationConfig,
    ) -> Vec<SimWarning> {
        let mut warnings = Vec::new();

        for node in network.nodes() {
            if node.handles(node.index.dummy_product()) {
                warnings.push(SimWarning::info(
                    node.index,
                    format!("未宣告產品，使用虛擬產品 {}", node.index.dummy_product()),
                ));
            }
            for product in node.products() {
                if nbom.links(node.index, product).is_empty() {
                    warnings.push(SimWarning::warning(
                        node.index,
                        format!("產品 {} 沒有任何原料來源，無法生產", product),
                    ));
                }
            }
        }

        for (node, product, raw_material, suppliers) in nbom.ambiguous_sources() {
            let names: Vec<String> = suppliers.iter().map(ToString::to_string).collect();
            warnings.push(SimWarning::warning(
                node,
                format!(
                    "產品 {} 的原料 {} 有多個供應商 [{}]，依 {:?} 規則分配訂單",
                    product,
                    raw_material,
                    names.join(", "),
                    config.supplier_allocation
                ),
            ));
        }

        warnings
    }

    fn initial_state(&self) -> Result<RunState> {
        let mut finished = BTreeMap::new();

        for node in self.network.nodes() {
            let supplier = Partner::Node(node.index);
            for product in node.products() {
                let params = self.params.product(node.index, product)?;
                // 負的初始水準算作對第一個實際取用該產品的下游節點的欠貨
                let backorder_to = if params.demand_source.is_some() {
                    Partner::External
                } else {
                    node.successors()
                        .find(|&successor| self.nbom.draws_from(successor, supplier, product))
                        .map(Partner::Node)
                        .unwrap_or(Partner::External)
                };
                finished.insert(
                    (node.index, product),
                    FinishedGoods::with_initial_level(params.initial_inventory_level, backorder_to),
                );
            }
        }

        Ok(RunState {
            finished,
            pool: RawMaterialPool::new(),
            pipeline: ShipmentPipeline::new(),
        })
    }

    /// 第一輪：需求、訂購量與原料訂單
    fn place_orders(
        &self,
        node: NodeIndex,
        period: usize,
        run: &mut RunState,
        states: &mut BTreeMap<NodeIndex, NodePeriodState>,
    ) -> Result<()> {
        let node_ref = self.network.node(node).ok_or(SimError::NodeNotFound(node))?;
        let state = states.get_mut(&node).ok_or(SimError::NodeNotFound(node))?;
        let mut raw_orders: BTreeMap<(Partner, ProductIndex), Decimal> = BTreeMap::new();

        for product in node_ref.products() {
            let params = self.params.product(node, product)?;
            if let Some(source) = &params.demand_source {
                state.add_inbound_order(Partner::External, product, source.demand(period));
            }

            let inbound = state.total_inbound_order(product);
            let goods = run
                .finished
                .get_mut(&(node, product))
                .ok_or(SimError::ProductNotFound(product))?;
            let position =
                OrderPlanner::inventory_position(goods.inventory_level(), goods.pending, inbound);
            let quantity = OrderPlanner::finished_order_quantity(&params.policy, position);
            goods.pending += quantity;
            state.order_quantity.insert(product, quantity);

            let orders = OrderPlanner::raw_material_orders(
                quantity,
                self.nbom.links(node, product),
                self.config.supplier_allocation,
            );
            for (key, quantity) in orders {
                *raw_orders.entry(key).or_insert(Decimal::ZERO) += quantity;
            }
        }

        for (&(supplier, raw_material), &quantity) in &raw_orders {
            state
                .raw_material_order
                .insert(FlowKey::new(supplier, raw_material), quantity);
        }

        for ((supplier, raw_material), quantity) in raw_orders {
            match supplier {
                // 外部供應商無限量，下單當期即全數出貨
                Partner::External => {
                    let lead_time = self.params.raw_material(node, raw_material)?.lead_time;
                    run.pipeline.dispatch(Shipment {
                        from: Partner::External,
                        to: node,
                        product: raw_material,
                        quantity,
                        shipped: period,
                        arrival: period + lead_time as usize,
                    });
                }
                Partner::Node(predecessor) => {
                    states
                        .get_mut(&predecessor)
                        .ok_or(SimError::NodeNotFound(predecessor))?
                        .add_inbound_order(Partner::Node(node), raw_material, quantity);
                }
            }
        }

        Ok(())
    }

    /// 收下本期到貨的原料
    fn receive(node: NodeIndex, period: usize, run: &mut RunState, state: &mut NodePeriodState) {
        for shipment in run.pipeline.take_arrivals(node, period) {
            run.pool
                .receive(node, shipment.product, shipment.quantity);
            *state
                .inbound_shipment
                .entry(FlowKey::new(shipment.from, shipment.product))
                .or_insert(Decimal::ZERO) += shipment.quantity;
        }
    }

    /// 依原料池生產成品
    fn produce(&self, node: NodeIndex, run: &mut RunState, state: &mut NodePeriodState) -> Result<()> {
        let node_ref = self.network.node(node).ok_or(SimError::NodeNotFound(node))?;

        let mut requests = BTreeMap::new();
        for product in node_ref.products() {
            let pending = run
                .finished
                .get(&(node, product))
                .map(|goods| goods.pending)
                .ok_or(SimError::ProductNotFound(product))?;
            let requirements = self
                .nbom
                .raw_materials(node, product)
                .into_iter()
                .map(|raw_material| {
                    (
                        raw_material,
                        self.nbom.unit_requirement(node, product, raw_material),
                    )
                })
                .collect();
            requests.insert(product, ProductionRequest { pending, requirements });
        }

        let raw_materials = self.nbom.raw_materials_at(node);
        for &raw_material in &raw_materials {
            state.raw_material_consumed.insert(raw_material, Decimal::ZERO);
        }

        let plan = ProductionPlanner::plan(
            self.config.pool_allocation,
            &requests,
            &run.pool.levels_at(node),
        );

        for (&product, request) in &requests {
            let quantity = plan.get(&product).copied().unwrap_or(Decimal::ZERO);
            for (&raw_material, &unit) in &request.requirements {
                let consumed = run.pool.consume(node, raw_material, quantity * unit);
                *state
                    .raw_material_consumed
                    .entry(raw_material)
                    .or_insert(Decimal::ZERO) += consumed;
            }
            if let Some(goods) = run.finished.get_mut(&(node, product)) {
                goods.pending -= quantity;
            }
            state.production.insert(product, quantity);
        }

        for raw_material in raw_materials {
            state
                .raw_material_inventory
                .insert(raw_material, run.pool.level(node, raw_material));
        }

        Ok(())
    }

    /// 出貨並更新庫存水準
    fn ship(
        &self,
        node: NodeIndex,
        period: usize,
        run: &mut RunState,
        state: &mut NodePeriodState,
    ) -> Result<()> {
        let node_ref = self.network.node(node).ok_or(SimError::NodeNotFound(node))?;

        for product in node_ref.products() {
            let orders: BTreeMap<Partner, Decimal> = state
                .inbound_order
                .iter()
                .filter(|(key, _)| key.product == product)
                .map(|(key, &quantity)| (key.partner, quantity))
                .collect();
            let produced = state.production(product);

            let goods = run
                .finished
                .get_mut(&(node, product))
                .ok_or(SimError::ProductNotFound(product))?;
            let shipped = goods.ship(produced, &orders);

            for (partner, quantity) in shipped {
                state
                    .outbound_shipment
                    .insert(FlowKey::new(partner, product), quantity);
                if let Partner::Node(successor) = partner {
                    if quantity <= Decimal::ZERO {
                        continue;
                    }
                    let lead_time = self.params.raw_material(successor, product)?.lead_time;
                    run.pipeline.dispatch(Shipment {
                        from: Partner::Node(node),
                        to: successor,
                        product,
                        quantity,
                        shipped: period,
                        arrival: period + lead_time as usize,
                    });
                }
            }

            for (&partner, &quantity) in &goods.backorders {
                state
                    .backorder
                    .insert(FlowKey::new(partner, product), quantity);
            }
            state.on_hand.insert(product, goods.on_hand);
            state
                .inventory_level
                .insert(product, goods.inventory_level());
            state.pending_finished_goods.insert(product, goods.pending);
        }

        Ok(())
    }
}
