//! 三階層供應鏈示例
//!
//! 兩家零件供應商（節點 3、4）同時供應原料 300，半成品廠（節點 2）
//! 以 2 個 300 製造 20，組裝廠（節點 1）以 1 個 20 組裝 10 並面對顧客。

use anyhow::Result;
use echelon::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"{
    "num_periods": 12,
    "pool_allocation": "proportional_to_pending",
    "supplier_allocation": "even_split"
}"#;

fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

fn build_network() -> Result<Network> {
    let mut network = Network::new();

    network.add_node(
        Node::new(NodeIndex(1))
            .with_name("組裝廠")
            .with_local_holding_cost(d(4))
            .with_stockout_cost(d(25))
            .with_shipment_lead_time(1)
            .with_demand_source(DemandSource::sequence([3, 4, 6, 2, 5, 7, 4, 3, 5, 6, 2, 4]))
            .with_inventory_policy(Policy::ReorderPointOrderUpTo {
                reorder_point: d(6),
                order_up_to_level: d(14),
            }),
    )?;
    network.add_node(
        Node::new(NodeIndex(2))
            .with_name("半成品廠")
            .with_local_holding_cost(d(2))
            .with_stockout_cost(d(5))
            .with_shipment_lead_time(1)
            .with_inventory_policy(Policy::ReorderPointQuantity {
                reorder_point: d(8),
                order_quantity: d(6),
            }),
    )?;
    for (index, name) in [(3, "供應商 A"), (4, "供應商 B")] {
        network.add_node(
            Node::new(NodeIndex(index))
                .with_name(name)
                .with_supply_type(SupplyType::Unlimited)
                .with_local_holding_cost(Decimal::new(5, 1))
                .with_stockout_cost(Decimal::ZERO)
                .with_shipment_lead_time(2)
                .with_inventory_policy(Policy::base_stock(d(20))),
        )?;
    }
    network.add_edge(NodeIndex(2), NodeIndex(1))?;
    network.add_edge(NodeIndex(3), NodeIndex(2))?;
    network.add_edge(NodeIndex(4), NodeIndex(2))?;

    network.add_product(Product::new(10).with_name("成品"))?;
    network.add_product(Product::new(20).with_name("半成品"))?;
    network.add_product(Product::new(300).with_name("原料"))?;
    network.set_bill_of_materials(ProductIndex(10), ProductIndex(20), d(1))?;
    network.set_bill_of_materials(ProductIndex(20), ProductIndex(300), d(2))?;

    network.assign_product(NodeIndex(1), ProductIndex(10))?;
    network.assign_product(NodeIndex(2), ProductIndex(20))?;
    network.assign_product(NodeIndex(3), ProductIndex(300))?;
    network.assign_product(NodeIndex(4), ProductIndex(300))?;

    Ok(network)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== 三階層供應鏈示例 ===\n");

    let config = SimulationConfig::from_json(CONFIG)?;
    let simulator = Simulator::new(build_network()?, config)?;

    println!("拓撲順序: {:?}", simulator.topological_order());
    for warning in simulator.warnings() {
        println!("[{:?}] 節點 {}: {}", warning.severity, warning.node, warning.message);
    }

    let result = simulator.run()?;

    println!("\n{:>3} | {:>10} {:>10} {:>10} {:>10}", "t", "節點 1", "節點 2", "節點 3", "節點 4");
    for period in 0..result.history.num_periods() {
        let levels: Vec<String> = [
            (1, ProductIndex(10)),
            (2, ProductIndex(20)),
            (3, ProductIndex(300)),
            (4, ProductIndex(300)),
        ]
        .iter()
        .map(|&(node, product)| {
            result
                .history
                .state(NodeIndex(node), period)
                .map(|state| format!("{:.2}", state.inventory_level(product)))
                .unwrap_or_default()
        })
        .collect();
        println!(
            "{:>3} | {:>10} {:>10} {:>10} {:>10}",
            period, levels[0], levels[1], levels[2], levels[3]
        );
    }

    println!("\n各節點總成本:");
    for node in 1..=4 {
        println!(
            "  節點 {}: {:.2}",
            node,
            result.history.node_total_cost(NodeIndex(node))
        );
    }
    println!("全部總成本: {:.2}", result.total_cost);

    if let Some(last) = result.history.state(NodeIndex(2), result.history.num_periods() - 1) {
        println!("\n節點 2 最後一期狀態:");
        println!("{}", serde_json::to_string_pretty(last)?);
    }

    Ok(())
}
