//! 成品出貨與欠貨
//!
//! 每個 (節點, 產品) 保有現有庫存與對每個下單方的欠貨。
//! 可出貨量 = 現有庫存 + 本期產量，依下單方排序出貨：外部顧客優先，其次為節點索引遞增。

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_core::Partner;

/// 單一 (節點, 產品) 的成品帳
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinishedGoods {
    /// 現有庫存（不為負）
    pub on_hand: Decimal,
    /// 下單方 -> 欠貨
    pub backorders: BTreeMap<Partner, Decimal>,
    /// 已訂購尚未生產的成品
    pub pending: Decimal,
}

impl FinishedGoods {
    /// 以初始庫存水準建立
    ///
    /// 負的初始水準記為 `backorder_to` 的欠貨。
    pub fn with_initial_level(level: Decimal, backorder_to: Partner) -> Self {
        let mut goods = Self {
            on_hand: level.max(Decimal::ZERO),
            ..Self::default()
        };
        if level < Decimal::ZERO {
            goods.backorders.insert(backorder_to, -level);
        }
        goods
    }

    pub fn total_backorder(&self) -> Decimal {
        self.backorders.values().copied().sum()
    }

    /// 帶正負號的庫存水準 = 現有庫存 - 欠貨
    pub fn inventory_level(&self) -> Decimal {
        self.on_hand - self.total_backorder()
    }

    /// 以本期產量出貨給所有下單方
    ///
    /// `orders` 為本期新訂單；回傳各下單方實際出貨量（含 0）。
    pub fn ship(
        &mut self,
        produced: Decimal,
        orders: &BTreeMap<Partner, Decimal>,
    ) -> BTreeMap<Partner, Decimal> {
        let mut requests = self.backorders.clone();
        for (&partner, &quantity) in orders {
            *requests.entry(partner).or_insert(Decimal::ZERO) += quantity;
        }

        let mut available = self.on_hand + produced;
        let mut shipped = BTreeMap::new();
        for (partner, request) in requests {
            let quantity = request.min(available).max(Decimal::ZERO);
            available -= quantity;
            shipped.insert(partner, quantity);

            let remaining = request - quantity;
            if remaining > Decimal::ZERO {
                self.backorders.insert(partner, remaining);
            } else {
                self.backorders.remove(&partner);
            }
        }

        self.on_hand = available;
        shipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echelon_core::NodeIndex;

    fn d(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn test_ship_from_stock() {
        let mut goods = FinishedGoods::with_initial_level(d(6), Partner::External);
        let shipped = goods.ship(Decimal::ZERO, &BTreeMap::from([(Partner::External, d(2))]));

        assert_eq!(shipped[&Partner::External], d(2));
        assert_eq!(goods.on_hand, d(4));
        assert_eq!(goods.inventory_level(), d(4));
    }

    #[test]
    fn test_shortfall_becomes_backorder() {
        // 庫存 1，產出 5/3，需求 5
        let mut goods = FinishedGoods::with_initial_level(d(1), Partner::External);
        let produced = d(5) / d(3);
        let shipped = goods.ship(produced, &BTreeMap::from([(Partner::External, d(5))]));

        assert_eq!(shipped[&Partner::External], d(1) + produced);
        assert_eq!(goods.on_hand, Decimal::ZERO);
        assert_eq!(goods.inventory_level(), d(1) + produced - d(5));
    }

    #[test]
    fn test_backorder_is_served_next_period() {
        let mut goods = FinishedGoods::with_initial_level(d(-3), Partner::External);
        assert_eq!(goods.inventory_level(), d(-3));

        let shipped = goods.ship(d(10), &BTreeMap::from([(Partner::External, d(2))]));
        assert_eq!(shipped[&Partner::External], d(5));
        assert_eq!(goods.inventory_level(), d(5));
        assert!(goods.backorders.is_empty());
    }

    #[test]
    fn test_external_customer_served_first() {
        let successor = Partner::Node(NodeIndex(1));
        let mut goods = FinishedGoods::with_initial_level(d(4), Partner::External);
        let orders = BTreeMap::from([(successor, d(3)), (Partner::External, d(3))]);

        let shipped = goods.ship(Decimal::ZERO, &orders);

        assert_eq!(shipped[&Partner::External], d(3));
        assert_eq!(shipped[&successor], d(1));
        assert_eq!(goods.backorders[&successor], d(2));
        // 庫存水準 = 上期水準 + 產量 - 新訂單
        assert_eq!(goods.inventory_level(), d(4) - d(6));
    }

    #[test]
    fn test_zero_shipment_is_recorded() {
        let successor = Partner::Node(NodeIndex(1));
        let mut goods = FinishedGoods::default();
        let shipped = goods.ship(Decimal::ZERO, &BTreeMap::from([(successor, d(2))]));

        assert_eq!(shipped[&successor], Decimal::ZERO);
        assert_eq!(goods.inventory_level(), d(-2));
    }
}
