//! 執行前參數解析
//!
//! 模擬開始前為每個 (節點, 產品) 與 (節點, 原料) 解析所有屬性，
//! 任何無法解析的屬性都在第 0 期之前回報。

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use echelon_cache::AttributeCache;
use echelon_core::{
    AttributeKey, AttributeValue, DemandSource, Network, NodeIndex, Policy, ProductIndex, Result,
    SimError,
};

use crate::nbom::NetworkBom;

/// 成品參數
#[derive(Debug, Clone)]
pub struct ProductParameters {
    pub holding_cost: Decimal,
    pub stockout_cost: Decimal,
    pub policy: Policy,
    pub initial_inventory_level: Decimal,
    pub demand_source: Option<DemandSource>,
}

/// 原料參數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMaterialParameters {
    /// 原料池持有成本
    pub holding_cost: Decimal,
    /// 送到此節點的運送提前期
    pub lead_time: u32,
}

/// 整次執行的參數
#[derive(Debug, Clone, Default)]
pub struct RunParameters {
    products: BTreeMap<(NodeIndex, ProductIndex), ProductParameters>,
    raw_materials: BTreeMap<(NodeIndex, ProductIndex), RawMaterialParameters>,
}

impl RunParameters {
    /// 解析網路上所有參數
    pub fn resolve(network: &Network, nbom: &NetworkBom, cache: &mut AttributeCache) -> Result<Self> {
        let mut products = BTreeMap::new();
        let mut raw_materials = BTreeMap::new();

        for node in network.nodes() {
            let n = node.index;
            for product in node.products() {
                let policy = cache
                    .get(network, n, AttributeKey::InventoryPolicy, product)?
                    .as_policy()
                    .cloned()
                    .ok_or(SimError::UnresolvedAttribute {
                        node: n,
                        attribute: AttributeKey::InventoryPolicy,
                        product,
                    })?;

                let initial_inventory_level =
                    match cache.get(network, n, AttributeKey::InitialInventoryLevel, product) {
                        Ok(value) => value.as_amount().unwrap_or_else(|| policy.initial_inventory_level()),
                        Err(SimError::UnresolvedAttribute { .. }) => policy.initial_inventory_level(),
                        Err(e) => return Err(e),
                    };

                let demand_source =
                    match cache.get(network, n, AttributeKey::DemandSource, product)? {
                        AttributeValue::Demand(source) => Some(source),
                        _ => None,
                    };

                products.insert(
                    (n, product),
                    ProductParameters {
                        holding_cost: amount(cache, network, n, AttributeKey::LocalHoldingCost, product)?,
                        stockout_cost: amount(cache, network, n, AttributeKey::StockoutCost, product)?,
                        policy,
                        initial_inventory_level,
                        demand_source,
                    },
                );
            }

            for raw_material in nbom.raw_materials_at(n) {
                let lead_time = cache
                    .get(network, n, AttributeKey::ShipmentLeadTime, raw_material)?
                    .as_periods()
                    .unwrap_or(0);
                raw_materials.insert(
                    (n, raw_material),
                    RawMaterialParameters {
                        holding_cost: amount(cache, network, n, AttributeKey::LocalHoldingCost, raw_material)?,
                        lead_time,
                    },
                );
            }
        }

        let stats = cache.stats();
        tracing::debug!(
            "參數解析完成：成品 {} 組、原料 {} 組（快取命中 {}，未命中 {}）",
            products.len(),
            raw_materials.len(),
            stats.hits,
            stats.misses
        );

        Ok(Self {
            products,
            raw_materials,
        })
    }

    pub fn product(&self, node: NodeIndex, product: ProductIndex) -> Result<&ProductParameters> {
        self.products
            .get(&(node, product))
            .ok_or(SimError::ProductNotFound(product))
    }

    pub fn raw_material(&self, node: NodeIndex, raw_material: ProductIndex) -> Result<&RawMaterialParameters> {
        self.raw_materials
            .get(&(node, raw_material))
            .ok_or(SimError::ProductNotFound(raw_material))
    }

    /// 原料池持有成本，節點沒有此原料時為 0
    pub fn raw_material_holding_cost(&self, node: NodeIndex, raw_material: ProductIndex) -> Decimal {
        self.raw_materials
            .get(&(node, raw_material))
            .map(|p| p.holding_cost)
            .unwrap_or(Decimal::ZERO)
    }
}

fn amount(
    cache: &mut AttributeCache,
    network: &Network,
    node: NodeIndex,
    key: AttributeKey,
    product: ProductIndex,
) -> Result<Decimal> {
    Ok(cache
        .get(network, node, key, product)?
        .as_amount()
        .unwrap_or(Decimal::ZERO))
}
