// ==========================================
// Kumex 切割车间 - 余额折叠引擎
// ==========================================
// 输入: 台账记录（插入顺序）
// 输出: BalanceSheet（未舍入）
// ==========================================
// 红线: 纯函数, 只依赖台账; 重算结果与增量更新一致
// 红线: 按插入顺序折叠, 不按 effective_date 重排
// 注: SET 对顺序敏感, 之前的记录被覆盖
// ==========================================

use crate::domain::ledger::{BalanceSheet, LedgerEntry};
use crate::domain::types::LedgerOp;

/// 从台账全量重算余额
///
/// 全部跟踪材料初始为 0, 之后逐条应用
pub fn recompute(entries: &[LedgerEntry]) -> BalanceSheet {
    let mut sheet = BalanceSheet::zero();
    for entry in entries {
        apply(&mut sheet, entry);
    }
    sheet
}

/// 应用单条记录
pub fn apply(sheet: &mut BalanceSheet, entry: &LedgerEntry) {
    let balance = sheet.entry_mut(entry.material);
    match entry.op {
        LedgerOp::Add => *balance += entry.amount_m2,
        LedgerOp::Sub | LedgerOp::MonthDeduct | LedgerOp::PeriodDeduct => {
            *balance -= entry.amount_m2
        }
        LedgerOp::Set => *balance = entry.amount_m2,
    }
}
