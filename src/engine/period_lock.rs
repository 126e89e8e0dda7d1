// ==========================================
// Kumex 切割车间 - 月份锁定引擎
// ==========================================
// 锁定状态完全由台账派生:
// 月份 M 锁定 ⇔ 存在 MONTH_DEDUCT/PERIOD_DEDUCT 记录覆盖 M
// ==========================================
// 红线: 不单独持久化锁定标记（closed_months 仅为缓存）
// 红线: 请求期间任一月份已锁定 → 整个扣减拒绝, 不部分执行
// ==========================================

use crate::domain::ledger::{LedgerEntry, MonthOrRange};
use crate::domain::types::{Material, YearMonth};
use chrono::Local;
use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// 已锁定月份（升序）
pub fn locked_months(entries: &[LedgerEntry]) -> BTreeSet<YearMonth> {
    entries
        .iter()
        .flat_map(|entry| entry.locked_months())
        .collect()
}

/// 月份是否已锁定
pub fn is_locked(entries: &[LedgerEntry], month: YearMonth) -> bool {
    entries
        .iter()
        .any(|entry| entry.locked_months().contains(&month))
}

/// 请求期间与已锁定月份的冲突（升序, 去重）
///
/// # 返回
/// 空列表表示可以扣减
pub fn conflicts(entries: &[LedgerEntry], period: &MonthOrRange) -> Vec<YearMonth> {
    let locked = locked_months(entries);
    period
        .months()
        .into_iter()
        .filter(|m| locked.contains(m))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// 覆盖指定月份的扣减记录 id（解锁时删除）
pub fn deductions_covering(entries: &[LedgerEntry], month: YearMonth) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| entry.locked_months().contains(&month))
        .map(|entry| entry.entry_id.clone())
        .collect()
}

/// 构造扣减记录
///
/// 规则：
/// - 每个金额为正的材料一条记录（按材料固定顺序）
/// - 金额为 0 或负的材料跳过
/// - effective_date = 期间起始月 1 日
/// - 同批记录共享 created_at
pub fn build_deduction_entries(
    amounts: &[(Material, Decimal)],
    period: &MonthOrRange,
    note: &str,
) -> Vec<LedgerEntry> {
    let effective_date = period.start().first_day();
    let created_at = Local::now().naive_local();
    let op = period.deduct_op();

    let mut sorted: Vec<(Material, Decimal)> = amounts.to_vec();
    sorted.sort_by_key(|(material, _)| *material);

    sorted
        .into_iter()
        .filter(|(_, amount)| *amount > Decimal::ZERO)
        .map(|(material, amount)| {
            let mut entry = LedgerEntry::new(material, op, amount, effective_date)
                .with_period(period.to_period())
                .with_note(note);
            entry.created_at = created_at;
            entry
        })
        .collect()
}
