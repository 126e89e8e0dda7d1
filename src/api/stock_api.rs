// ==========================================
// Kumex 切割车间 - 材料台账 API
// ==========================================
// 职责: 月份扣减（锁定协调）/ 解锁 / 手工增减 / 设定余额 / 撤销
// 状态机（每月）: OPEN → 扣减成功 → LOCKED → 删除该扣减 → OPEN
// 红线: 锁定冲突整体拒绝, 不做部分扣减
// ==========================================

mod core;

#[cfg(test)]
mod tests;

pub use self::core::{DeductOutcome, StockApi};
