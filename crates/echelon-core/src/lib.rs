//! # Echelon Core
//!
//! 多階層、多產品庫存模擬的核心資料模型與類型定義

pub mod attribute;
pub mod bom;
pub mod config;
pub mod demand;
pub mod network;
pub mod node;
pub mod policy;
pub mod product;

// Re-export 主要類型
pub use attribute::{AttributeKey, AttributeValue, NodeAttribute};
pub use bom::BomGraph;
pub use config::{PoolAllocation, SimulationConfig, SupplierAllocation};
pub use demand::{DemandGenerator, DemandSource};
pub use network::Network;
pub use node::{Node, NodeAttributes, NodeIndex, Partner, SupplyType};
pub use policy::Policy;
pub use product::{Product, ProductAttributes, ProductIndex};

use rust_decimal::Decimal;

/// 模擬錯誤類型
///
/// 除 `InvalidConfig` 外皆為執行前驗證時偵測的組態錯誤，
/// 一旦發生即中止，不會模擬第 0 期。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error("BOM 形成循環: {product} -> {raw_material}")]
    CyclicBom {
        product: ProductIndex,
        raw_material: ProductIndex,
    },

    #[error("無效的 BOM 用量: {product} -> {raw_material} = {quantity}")]
    InvalidBomQuantity {
        product: ProductIndex,
        raw_material: ProductIndex,
        quantity: Decimal,
    },

    #[error("網路拓撲形成循環: {0}")]
    CyclicNetwork(String),

    #[error("找不到節點: {0}")]
    NodeNotFound(NodeIndex),

    #[error("找不到產品: {0}")]
    ProductNotFound(ProductIndex),

    #[error("節點重複: {0}")]
    DuplicateNode(NodeIndex),

    #[error("產品重複: {0}")]
    DuplicateProduct(ProductIndex),

    #[error("產品索引保留給虛擬產品: {0}")]
    ReservedProductIndex(ProductIndex),

    #[error("節點 {0} 沒有上游節點且未標記外部供應")]
    MissingSupply(NodeIndex),

    #[error("無法解析屬性 {attribute}（節點 {node}，產品 {product}）")]
    UnresolvedAttribute {
        node: NodeIndex,
        attribute: AttributeKey,
        product: ProductIndex,
    },

    #[error("節點 {node} 的屬性 {attribute} 指定了未處理的產品 {product}")]
    UnknownProductOverride {
        node: NodeIndex,
        attribute: AttributeKey,
        product: ProductIndex,
    },

    #[error("無效的組態: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
