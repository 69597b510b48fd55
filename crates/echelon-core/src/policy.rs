//! 庫存政策

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SimError};

/// 庫存政策
///
/// 依庫存位置（inventory position）決定每期的訂購量，單位為成品數量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Policy {
    /// 基礎庫存（Base-Stock）- 補足到目標水準
    BaseStock { base_stock_level: Decimal },

    /// (s, S) - 庫存位置不高於 s 時補足到 S
    ReorderPointOrderUpTo {
        reorder_point: Decimal,
        order_up_to_level: Decimal,
    },

    /// (r, Q) - 庫存位置不高於 r 時訂購 Q 的倍數，使其回到 r 之上
    ReorderPointQuantity {
        reorder_point: Decimal,
        order_quantity: Decimal,
    },

    /// 固定訂購量 - 每期訂購 Q
    FixedQuantity { order_quantity: Decimal },
}

impl Policy {
    /// 基礎庫存政策
    pub fn base_stock(base_stock_level: Decimal) -> Self {
        Policy::BaseStock { base_stock_level }
    }

    /// 檢查參數是否合理
    pub fn validate(&self) -> Result<()> {
        match self {
            Policy::BaseStock { .. } => Ok(()),
            Policy::ReorderPointOrderUpTo {
                reorder_point,
                order_up_to_level,
            } => {
                if reorder_point > order_up_to_level {
                    return Err(SimError::InvalidConfig(format!(
                        "(s, S) 政策的 s={} 大於 S={}",
                        reorder_point, order_up_to_level
                    )));
                }
                Ok(())
            }
            Policy::ReorderPointQuantity { order_quantity, .. } => {
                if *order_quantity <= Decimal::ZERO {
                    return Err(SimError::InvalidConfig(format!(
                        "(r, Q) 政策的 Q 必須為正數: {}",
                        order_quantity
                    )));
                }
                Ok(())
            }
            Policy::FixedQuantity { order_quantity } => {
                if *order_quantity < Decimal::ZERO {
                    return Err(SimError::InvalidConfig(format!(
                        "固定訂購量不可為負數: {}",
                        order_quantity
                    )));
                }
                Ok(())
            }
        }
    }

    /// 根據庫存位置計算訂購量（不小於 0）
    pub fn order_quantity(&self, inventory_position: Decimal) -> Decimal {
        match self {
            Policy::BaseStock { base_stock_level } => {
                (*base_stock_level - inventory_position).max(Decimal::ZERO)
            }
            Policy::ReorderPointOrderUpTo {
                reorder_point,
                order_up_to_level,
            } => {
                if inventory_position <= *reorder_point {
                    (*order_up_to_level - inventory_position).max(Decimal::ZERO)
                } else {
                    Decimal::ZERO
                }
            }
            Policy::ReorderPointQuantity {
                reorder_point,
                order_quantity,
            } => {
                if *order_quantity <= Decimal::ZERO || inventory_position > *reorder_point {
                    return Decimal::ZERO;
                }
                let batches = ((*reorder_point - inventory_position) / *order_quantity).floor()
                    + Decimal::ONE;
                batches * *order_quantity
            }
            Policy::FixedQuantity { order_quantity } => *order_quantity,
        }
    }

    /// 政策的自然初始庫存水準
    pub fn initial_inventory_level(&self) -> Decimal {
        match self {
            Policy::BaseStock { base_stock_level } => *base_stock_level,
            Policy::ReorderPointOrderUpTo {
                order_up_to_level, ..
            } => *order_up_to_level,
            Policy::ReorderPointQuantity {
                reorder_point,
                order_quantity,
            } => *reorder_point + *order_quantity,
            Policy::FixedQuantity { .. } => Decimal::ZERO,
        }
    }
}
