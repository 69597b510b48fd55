//! 訂購計算

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_core::{Partner, Policy, ProductIndex, SupplierAllocation};

use crate::nbom::RawMaterialLink;

/// 訂購計算器
pub struct OrderPlanner;

impl OrderPlanner {
    /// 庫存位置 = 上期庫存水準 + 待生產成品 - 本期進貨訂單
    pub fn inventory_position(
        inventory_level: Decimal,
        pending_finished_goods: Decimal,
        inbound_order: Decimal,
    ) -> Decimal {
        inventory_level + pending_finished_goods - inbound_order
    }

    /// 依政策計算成品訂購量
    pub fn finished_order_quantity(policy: &Policy, inventory_position: Decimal) -> Decimal {
        policy.order_quantity(inventory_position)
    }

    /// 將成品訂購量換算成對各供應商的原料訂單
    ///
    /// 原料訂購量 = 成品訂購量 × NBOM，不做捨入。
    /// 同一原料有多個供應商時依分配規則處理。
    pub fn raw_material_orders(
        order_quantity: Decimal,
        links: &[RawMaterialLink],
        rule: SupplierAllocation,
    ) -> BTreeMap<(Partner, ProductIndex), Decimal> {
        let mut by_raw_material: BTreeMap<ProductIndex, Vec<&RawMaterialLink>> = BTreeMap::new();
        for link in links {
            by_raw_material
                .entry(link.raw_material)
                .or_default()
                .push(link);
        }

        let mut orders = BTreeMap::new();
        for (raw_material, sources) in by_raw_material {
            match rule {
                SupplierAllocation::LowestIndex => {
                    if let Some(link) = sources.first() {
                        *orders
                            .entry((link.supplier, raw_material))
                            .or_insert(Decimal::ZERO) += order_quantity * link.quantity;
                    }
                }
                SupplierAllocation::EvenSplit => {
                    let count = Decimal::from(sources.len());
                    for link in sources {
                        *orders
                            .entry((link.supplier, raw_material))
                            .or_insert(Decimal::ZERO) += order_quantity * link.quantity / count;
                    }
                }
            }
        }

        orders
    }
}
