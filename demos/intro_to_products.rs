//! 兩階層多產品模擬示例
//!
//! 節點 2 由外部供應商補充產品 20 與 30，節點 1 以 5 個 20 加 3 個 30 組裝產品 10。

use anyhow::Result;
use echelon::prelude::*;
use tracing_subscriber::EnvFilter;

fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

fn build_network() -> Result<Network> {
    let mut network = Network::new();
    network.add_node(
        Node::new(NodeIndex(1))
            .with_name("組裝廠")
            .with_local_holding_cost(d(5))
            .with_stockout_cost(d(20))
            .with_shipment_lead_time(1)
            .with_demand_source(DemandSource::sequence([2, 2, 1, 5, 5, 5, 2, 2, 2, 1, 3])),
    )?;
    network.add_node(
        Node::new(NodeIndex(2))
            .with_name("零件廠")
            .with_supply_type(SupplyType::Unlimited)
            .with_stockout_cost(Decimal::ZERO)
            .with_shipment_lead_time(2),
    )?;
    network.add_edge(NodeIndex(2), NodeIndex(1))?;

    network.add_product(
        Product::new(10)
            .with_name("成品")
            .with_inventory_policy(Policy::base_stock(d(6))),
    )?;
    network.add_product(Product::new(20).with_name("零件 A").with_local_holding_cost(d(2)))?;
    network.add_product(Product::new(30).with_name("零件 B").with_local_holding_cost(d(3)))?;
    network.set_bill_of_materials(ProductIndex(10), ProductIndex(20), d(5))?;
    network.set_bill_of_materials(ProductIndex(10), ProductIndex(30), d(3))?;

    network.assign_product(NodeIndex(1), ProductIndex(10))?;
    network.assign_products(NodeIndex(2), [ProductIndex(20), ProductIndex(30)])?;
    if let Some(node) = network.node_mut(NodeIndex(2)) {
        node.attributes.inventory_policy = NodeAttribute::per_product([
            (20, Policy::base_stock(d(35))),
            (30, Policy::base_stock(d(20))),
        ]);
    }

    Ok(network)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== 兩階層多產品模擬示例 ===\n");

    let simulator = Simulator::new(build_network()?, SimulationConfig::new(11))?;
    let result = simulator.run()?;

    for warning in &result.warnings {
        println!("[{:?}] 節點 {}: {}", warning.severity, warning.node, warning.message);
    }

    println!(
        "{:>3} {:>5} | {:>6} {:>6} {:>6} {:>8} {:>8} | {:>7} {:>7} {:>6}",
        "t", "節點", "需求", "訂購", "產量", "水準", "原料", "持有", "缺貨", "總成本"
    );
    for period in 0..result.history.num_periods() {
        if let Some(states) = result.history.period(period) {
            for state in states.values() {
                let orders: Decimal = state.inbound_order.values().sum();
                let ordered: Decimal = state.order_quantity.values().sum();
                let produced: Decimal = state.production.values().sum();
                let level: Decimal = state.inventory_level.values().sum();
                let raw: Decimal = state.raw_material_inventory.values().sum();
                println!(
                    "{:>3} {:>5} | {:>6} {:>6} {:>6} {:>8.2} {:>8.2} | {:>7.2} {:>7.2} {:>6.2}",
                    period,
                    state.node,
                    orders,
                    ordered,
                    produced.round_dp(2),
                    level,
                    raw,
                    state.holding_cost,
                    state.stockout_cost,
                    state.total_cost
                );
            }
        }
    }

    println!("\n節點 1 總成本: {:.2}", result.history.node_total_cost(NodeIndex(1)));
    println!("節點 2 總成本: {:.2}", result.history.node_total_cost(NodeIndex(2)));
    println!("全部總成本:   {:.2}", result.total_cost);
    if let Some(ms) = result.calculation_time_ms {
        println!("計算耗時: {} ms", ms);
    }

    Ok(())
}
