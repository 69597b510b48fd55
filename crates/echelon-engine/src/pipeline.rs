//! 運送中的貨物

use rust_decimal::Decimal;
use serde::Serialize;

use echelon_core::{NodeIndex, Partner, ProductIndex};

/// 一筆出貨
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shipment {
    /// 出貨方
    pub from: Partner,
    /// 收貨節點
    pub to: NodeIndex,
    pub product: ProductIndex,
    pub quantity: Decimal,
    /// 出貨期間
    pub shipped: usize,
    /// 到貨期間
    pub arrival: usize,
}

impl Shipment {
    /// 第 `period` 期期末是否仍在運送中
    pub fn in_transit_at(&self, period: usize) -> bool {
        self.shipped <= period && period < self.arrival
    }
}

/// 運送管線
#[derive(Debug, Clone, Default)]
pub struct ShipmentPipeline {
    shipments: Vec<Shipment>,
}

impl ShipmentPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入出貨，數量為 0 的出貨不加入
    pub fn dispatch(&mut self, shipment: Shipment) {
        if shipment.quantity > Decimal::ZERO {
            self.shipments.push(shipment);
        }
    }

    /// 取出節點在本期（含之前）到貨的出貨
    pub fn take_arrivals(&mut self, to: NodeIndex, period: usize) -> Vec<Shipment> {
        let (arrived, waiting): (Vec<Shipment>, Vec<Shipment>) = std::mem::take(&mut self.shipments)
            .into_iter()
            .partition(|s| s.to == to && s.arrival <= period);
        self.shipments = waiting;
        arrived
    }

    /// 節點送出且在 `period` 期末仍在運送中的出貨
    pub fn in_transit_from(&self, node: NodeIndex, period: usize) -> impl Iterator<Item = &Shipment> {
        self.shipments
            .iter()
            .filter(move |s| s.from == Partner::Node(node) && s.in_transit_at(period))
    }

    pub fn len(&self) -> usize {
        self.shipments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shipments.is_empty()
    }
}
