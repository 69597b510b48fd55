//! 產品目錄與 BOM 圖

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::product::{Product, ProductIndex};
use crate::{Result, SimError};

/// 產品目錄與物料清單（BOM）
///
/// 邊的方向為「成品 → 原料」，數量為生產一單位成品所需的原料量。
/// 圖必須保持無環，`set_bill_of_materials` 會拒絕造成循環的邊。
#[derive(Debug, Clone, Default)]
pub struct BomGraph {
    products: BTreeMap<ProductIndex, Product>,
    edges: BTreeMap<ProductIndex, BTreeMap<ProductIndex, Decimal>>,
}

impl BomGraph {
    /// 創建空的 BOM 圖
    pub fn new() -> Self {
        Self::default()
    }

    /// 註冊使用者產品，索引必須為正數
    pub fn add_product(&mut self, product: Product) -> Result<()> {
        if product.index.0 <= 0 {
            return Err(SimError::ReservedProductIndex(product.index));
        }
        if self.products.contains_key(&product.index) {
            return Err(SimError::DuplicateProduct(product.index));
        }
        self.products.insert(product.index, product);
        Ok(())
    }

    /// 註冊虛擬產品（已存在則忽略）
    pub(crate) fn insert_dummy(&mut self, product: Product) {
        self.products.entry(product.index).or_insert(product);
    }

    pub(crate) fn remove_dummy(&mut self, index: ProductIndex) {
        if index.is_dummy() {
            self.products.remove(&index);
            self.edges.remove(&index);
        }
    }

    pub fn product(&self, index: ProductIndex) -> Option<&Product> {
        self.products.get(&index)
    }

    pub fn product_mut(&mut self, index: ProductIndex) -> Option<&mut Product> {
        self.products.get_mut(&index)
    }

    pub fn contains(&self, index: ProductIndex) -> bool {
        self.products.contains_key(&index)
    }

    /// 依索引遞增順序列出所有產品
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// 設定 BOM 用量
    ///
    /// 重複設定同一對產品時覆寫原用量。
    pub fn set_bill_of_materials(
        &mut self,
        product: ProductIndex,
        raw_material: ProductIndex,
        quantity: Decimal,
    ) -> Result<()> {
        if !self.contains(product) {
            return Err(SimError::ProductNotFound(product));
        }
        if !self.contains(raw_material) {
            return Err(SimError::ProductNotFound(raw_material));
        }
        if quantity <= Decimal::ZERO {
            return Err(SimError::InvalidBomQuantity {
                product,
                raw_material,
                quantity,
            });
        }
        if product == raw_material || self.reaches(raw_material, product) {
            return Err(SimError::CyclicBom {
                product,
                raw_material,
            });
        }

        self.edges
            .entry(product)
            .or_default()
            .insert(raw_material, quantity);

        tracing::debug!("BOM: {} 需要 {} x {}", product, quantity, raw_material);
        Ok(())
    }

    /// 移除 BOM 關係，返回原用量
    pub fn remove_bill_of_materials(
        &mut self,
        product: ProductIndex,
        raw_material: ProductIndex,
    ) -> Option<Decimal> {
        let removed = self.edges.get_mut(&product)?.remove(&raw_material);
        if self.edges.get(&product).is_some_and(|rms| rms.is_empty()) {
            self.edges.remove(&product);
        }
        removed
    }

    /// 產品的所有原料（索引遞增）
    pub fn raw_materials_of(&self, product: ProductIndex) -> Vec<ProductIndex> {
        self.edges
            .get(&product)
            .map(|rms| rms.keys().copied().collect())
            .unwrap_or_default()
    }

    /// BOM 用量，無關係時為 0
    pub fn bom_quantity(&self, product: ProductIndex, raw_material: ProductIndex) -> Decimal {
        self.edges
            .get(&product)
            .and_then(|rms| rms.get(&raw_material))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// 兩產品之間是否存在明確的 BOM 關係
    pub fn has_relationship(&self, product: ProductIndex, raw_material: ProductIndex) -> bool {
        self.edges
            .get(&product)
            .is_some_and(|rms| rms.contains_key(&raw_material))
    }

    /// `from` 沿 BOM 邊是否可達 `to`
    fn reaches(&self, from: ProductIndex, to: ProductIndex) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(rms) = self.edges.get(&current) {
                stack.extend(rms.keys().copied());
            }
        }

        false
    }
}
