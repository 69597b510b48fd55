//! 測試用網路

use rust_decimal::Decimal;

use echelon_core::{
    DemandSource, Network, Node, NodeAttribute, NodeIndex, Policy, Product, ProductIndex,
    SupplyType,
};

pub(crate) fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

pub(crate) const INTRO_DEMAND: [i64; 11] = [2, 2, 1, 5, 5, 5, 2, 2, 2, 1, 3];

/// 兩節點、三產品的序列網路
///
/// 節點 2（外部供應）→ 節點 1（面對顧客）。產品 10 需要 5 個 20 與 3 個 30。
pub(crate) fn intro_network() -> Network {
    let mut network = Network::new();
    network
        .add_node(
            Node::new(NodeIndex(1))
                .with_local_holding_cost(d(5))
                .with_stockout_cost(d(20))
                .with_shipment_lead_time(1)
                .with_demand_source(DemandSource::sequence(INTRO_DEMAND)),
        )
        .unwrap();
    network
        .add_node(
            Node::new(NodeIndex(2))
                .with_supply_type(SupplyType::Unlimited)
                .with_stockout_cost(Decimal::ZERO)
                .with_shipment_lead_time(2),
        )
        .unwrap();
    network.add_edge(NodeIndex(2), NodeIndex(1)).unwrap();

    network
        .add_product(Product::new(10).with_inventory_policy(Policy::base_stock(d(6))))
        .unwrap();
    network
        .add_product(Product::new(20).with_local_holding_cost(d(2)))
        .unwrap();
    network
        .add_product(Product::new(30).with_local_holding_cost(d(3)))
        .unwrap();
    network
        .set_bill_of_materials(ProductIndex(10), ProductIndex(20), d(5))
        .unwrap();
    network
        .set_bill_of_materials(ProductIndex(10), ProductIndex(30), d(3))
        .unwrap();

    network.assign_product(NodeIndex(1), ProductIndex(10)).unwrap();
    network
        .assign_products(NodeIndex(2), [ProductIndex(20), ProductIndex(30)])
        .unwrap();
    network.node_mut(NodeIndex(2)).unwrap().attributes.inventory_policy = NodeAttribute::per_product([
        (20, Policy::base_stock(d(35))),
        (30, Policy::base_stock(d(20))),
    ]);

    network.finalize().unwrap();
    network
}
