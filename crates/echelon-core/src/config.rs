//! 模擬配置模型

use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 模擬執行參數
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 模擬期數
    pub num_periods: usize,

    /// 原料池分配政策
    #[serde(default)]
    pub pool_allocation: PoolAllocation,

    /// 多供應商分配規則
    #[serde(default)]
    pub supplier_allocation: SupplierAllocation,
}

impl SimulationConfig {
    /// 創建新的模擬配置
    pub fn new(num_periods: usize) -> Self {
        Self {
            num_periods,
            pool_allocation: PoolAllocation::default(),
            supplier_allocation: SupplierAllocation::default(),
        }
    }

    /// 從 JSON 載入
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SimError::InvalidConfig(format!("無法解析配置: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置原料池分配政策
    pub fn with_pool_allocation(mut self, policy: PoolAllocation) -> Self {
        self.pool_allocation = policy;
        self
    }

    /// 建構器模式：設置多供應商分配規則
    pub fn with_supplier_allocation(mut self, rule: SupplierAllocation) -> Self {
        self.supplier_allocation = rule;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_periods == 0 {
            return Err(SimError::InvalidConfig("模擬期數必須大於 0".to_string()));
        }
        Ok(())
    }
}

/// 原料池分配政策
///
/// 同一節點上多個產品共用同一原料時，原料不足情況下的分配方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolAllocation {
    /// 依待生產需求比例分配
    #[default]
    ProportionalToPending,

    /// 依產品索引遞增順序優先取用
    AscendingProductIndex,
}

/// 多供應商分配規則
///
/// 同一原料可由多個供應商提供時，訂單的分配方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierAllocation {
    /// 全部訂給排序最前的供應商（外部供應商優先，其次為索引最小的節點）
    #[default]
    LowestIndex,

    /// 平均分給所有供應商
    EvenSplit,
}
