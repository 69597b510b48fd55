//! # Echelon Simulation Engine
//!
//! 多階層庫存模擬引擎：每期依序下單、收料、生產、出貨與計算成本

pub mod cost;
pub mod nbom;
pub mod ordering;
pub mod parameters;
pub mod pipeline;
pub mod pool;
pub mod production;
pub mod shipping;
pub mod simulator;
pub mod state;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export 主要類型
pub use cost::{CostAccountant, CostBreakdown};
pub use nbom::{nbom, NetworkBom, RawMaterialLink};
pub use parameters::{ProductParameters, RawMaterialParameters, RunParameters};
pub use pipeline::{Shipment, ShipmentPipeline};
pub use pool::RawMaterialPool;
pub use simulator::Simulator;
pub use state::{FlowKey, NodePeriodState, SimulationHistory};

use echelon_core::NodeIndex;
use rust_decimal::Decimal;

/// 模擬結果
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// 每期每節點的狀態
    pub history: SimulationHistory,

    /// 所有節點、所有期間的總成本
    pub total_cost: Decimal,

    /// 警告信息
    pub warnings: Vec<SimWarning>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u128>,
}

impl SimulationResult {
    /// 添加警告
    pub fn add_warning(&mut self, warning: SimWarning) {
        self.warnings.push(warning);
    }
}

/// 模擬警告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimWarning {
    pub node: NodeIndex,
    pub message: String,
    pub severity: WarningSeverity,
}

impl SimWarning {
    pub fn new(node: NodeIndex, message: String, severity: WarningSeverity) -> Self {
        Self {
            node,
            message,
            severity,
        }
    }

    pub fn info(node: NodeIndex, message: String) -> Self {
        Self::new(node, message, WarningSeverity::Info)
    }

    pub fn warning(node: NodeIndex, message: String) -> Self {
        Self::new(node, message, WarningSeverity::Warning)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Info,
    Warning,
}
