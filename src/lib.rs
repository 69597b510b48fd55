//! # Echelon
//!
//! 多階層、多產品庫存模擬
//!
//! - [`echelon_core`]：產品、BOM、節點、屬性解析與網路拓撲
//! - [`echelon_cache`]：屬性解析快取
//! - [`echelon_engine`]：NBOM、原料池、每期下單/生產/出貨與成本計算

pub use echelon_cache;
pub use echelon_core;
pub use echelon_engine;

pub use echelon_core::{Result, SimError};

/// 常用類型
pub mod prelude {
    pub use echelon_core::{
        AttributeKey, AttributeValue, DemandGenerator, DemandSource, Network, Node,
        NodeAttribute, NodeIndex, Partner, Policy, PoolAllocation, Product, ProductIndex,
        SimError, SimulationConfig, SupplierAllocation, SupplyType,
    };
    pub use echelon_engine::{
        FlowKey, NodePeriodState, SimWarning, SimulationHistory, SimulationResult, Simulator,
        WarningSeverity,
    };
    pub use rust_decimal::Decimal;
}
