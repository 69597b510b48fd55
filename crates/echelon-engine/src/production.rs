//! 生產數量計算
//!
//! 產量受限於最缺的原料：min(待生產量, min_r 可用原料 ÷ 單位用量)。

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_core::{PoolAllocation, ProductIndex};

/// 單一產品的生產需求
#[derive(Debug, Clone)]
pub struct ProductionRequest {
    /// 待生產的成品數量
    pub pending: Decimal,
    /// 原料 -> 單位用量（皆為正數）
    pub requirements: BTreeMap<ProductIndex, Decimal>,
}

/// 生產計算器
pub struct ProductionPlanner;

impl ProductionPlanner {
    /// 依原料池分配政策計算各產品本期產量
    ///
    /// 沒有任何原料需求的產品無法生產，產量為 0。
    pub fn plan(
        allocation: PoolAllocation,
        requests: &BTreeMap<ProductIndex, ProductionRequest>,
        pool: &BTreeMap<ProductIndex, Decimal>,
    ) -> BTreeMap<ProductIndex, Decimal> {
        match allocation {
            PoolAllocation::ProportionalToPending => Self::proportional(requests, pool),
            PoolAllocation::AscendingProductIndex => Self::ascending(requests, pool),
        }
    }

    /// 原料不足時依待生產需求比例分配
    fn proportional(
        requests: &BTreeMap<ProductIndex, ProductionRequest>,
        pool: &BTreeMap<ProductIndex, Decimal>,
    ) -> BTreeMap<ProductIndex, Decimal> {
        // 每種原料的總需求
        let mut total_need: BTreeMap<ProductIndex, Decimal> = BTreeMap::new();
        for request in requests.values() {
            for (&raw_material, &unit) in &request.requirements {
                *total_need.entry(raw_material).or_insert(Decimal::ZERO) += request.pending * unit;
            }
        }

        requests
            .iter()
            .map(|(&product, request)| {
                let quantity = Self::bounded(request, |raw_material, unit| {
                    let available = pool_level(pool, raw_material);
                    let total = total_need
                        .get(&raw_material)
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    let share = if total <= available {
                        available
                    } else if total > Decimal::ZERO {
                        available * (request.pending * unit) / total
                    } else {
                        Decimal::ZERO
                    };
                    share / unit
                });
                (product, quantity)
            })
            .collect()
    }

    /// 依產品索引遞增順序從原料池取料
    fn ascending(
        requests: &BTreeMap<ProductIndex, ProductionRequest>,
        pool: &BTreeMap<ProductIndex, Decimal>,
    ) -> BTreeMap<ProductIndex, Decimal> {
        let mut remaining = pool.clone();
        let mut plan = BTreeMap::new();

        for (&product, request) in requests {
            let quantity = Self::bounded(request, |raw_material, unit| {
                pool_level(&remaining, raw_material) / unit
            });
            for (&raw_material, &unit) in &request.requirements {
                if let Some(level) = remaining.get_mut(&raw_material) {
                    *level = (*level - quantity * unit).max(Decimal::ZERO);
                }
            }
            plan.insert(product, quantity);
        }

        plan
    }

    /// min(待生產量, 各原料可支援的產量)
    fn bounded<F>(request: &ProductionRequest, mut capacity: F) -> Decimal
    where
        F: FnMut(ProductIndex, Decimal) -> Decimal,
    {
        if request.requirements.is_empty() || request.pending <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        request
            .requirements
            .iter()
            .filter(|(_, unit)| **unit > Decimal::ZERO)
            .map(|(&raw_material, &unit)| capacity(raw_material, unit))
            .fold(request.pending, Decimal::min)
            .max(Decimal::ZERO)
    }
}

fn pool_level(pool: &BTreeMap<ProductIndex, Decimal>, raw_material: ProductIndex) -> Decimal {
    pool.get(&raw_material)
        .copied()
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}
