//! 外部需求來源

use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

use crate::{Result, SimError};

/// 外部需求產生器
///
/// 隨機需求抽樣不屬於引擎範圍，由呼叫端實作此 trait 提供每期需求。
pub trait DemandGenerator: fmt::Debug + Send + Sync {
    /// 第 `period` 期的需求量
    fn demand(&self, period: usize) -> Decimal;
}

/// 需求來源
#[derive(Debug, Clone)]
pub enum DemandSource {
    /// 固定序列，超出長度的期間需求為 0
    Sequence(Vec<Decimal>),

    /// 每期固定需求
    Constant(Decimal),

    /// 外部產生器
    External(Arc<dyn DemandGenerator>),
}

impl DemandSource {
    /// 由整數序列建立
    pub fn sequence<I>(demands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Decimal>,
    {
        DemandSource::Sequence(demands.into_iter().map(Into::into).collect())
    }

    /// 第 `period` 期的需求量，負值視為 0
    pub fn demand(&self, period: usize) -> Decimal {
        let quantity = match self {
            DemandSource::Sequence(demands) => {
                demands.get(period).copied().unwrap_or(Decimal::ZERO)
            }
            DemandSource::Constant(quantity) => *quantity,
            DemandSource::External(generator) => generator.demand(period),
        };
        quantity.max(Decimal::ZERO)
    }

    /// 檢查固定需求不為負數
    pub fn validate(&self) -> Result<()> {
        let negative = match self {
            DemandSource::Sequence(demands) => demands.iter().any(|d| d.is_sign_negative()),
            DemandSource::Constant(quantity) => quantity.is_sign_negative(),
            DemandSource::External(_) => false,
        };
        if negative {
            return Err(SimError::InvalidConfig("需求量不可為負數".to_string()));
        }
        Ok(())
    }
}
