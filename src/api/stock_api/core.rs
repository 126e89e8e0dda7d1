use crate::api::error::{ApiError, ApiResult};
use crate::domain::ledger::{round_m2, BalanceSheet, LedgerEntry, LedgerFilter, MonthOrRange};
use crate::domain::plan::PlanOutcome;
use crate::domain::types::{LedgerOp, Material, YearMonth};
use crate::engine::period_lock;
use crate::i18n;
use crate::repository::ledger_repo::LedgerRepository;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// DeductOutcome - 扣减结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "entries", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeductOutcome {
    /// 已过账的扣减记录
    Posted(Vec<LedgerEntry>),
    /// 全部材料金额为 0, 未过账
    NothingToDeduct,
}

// ==========================================
// StockApi - 材料台账 API
// ==========================================

/// 材料台账API
///
/// 职责：
/// 1. 月份/期间扣减（锁定冲突检查）
/// 2. 解锁月份（删除覆盖该月的扣减记录）
/// 3. 手工增减、设定余额、撤销手工记录
/// 4. 余额与台账查询
pub struct StockApi {
    ledger_repo: Arc<LedgerRepository>,
}

impl StockApi {
    pub fn new(ledger_repo: Arc<LedgerRepository>) -> Self {
        Self { ledger_repo }
    }

    // ==========================================
    // 扣减 / 解锁
    // ==========================================

    /// 尝试扣减
    ///
    /// # 参数
    /// - `amounts`: 各材料扣减面积（过账前四舍五入到 2 位）
    /// - `period`: 单月或区间
    /// - `note`: 备注
    ///
    /// # 返回
    /// - Ok(Posted): 已追加的扣减记录（单月 MONTH_DEDUCT, 区间 PERIOD_DEDUCT）
    /// - Ok(NothingToDeduct): 全部为 0, 未写入
    /// - Err(LockConflict): 期间内存在已锁定月份, 未写入
    pub fn try_deduct(
        &self,
        amounts: &[(Material, Decimal)],
        period: MonthOrRange,
        note: &str,
    ) -> ApiResult<DeductOutcome> {
        validate_period(&period)?;
        for (material, amount) in amounts {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(ApiError::InvalidInput(format!(
                    "{} 扣减面积不能为负: {}",
                    material, amount
                )));
            }
        }

        let rounded: Vec<(Material, Decimal)> = amounts
            .iter()
            .map(|(material, amount)| (*material, round_m2(*amount)))
            .collect();
        let entries = period_lock::build_deduction_entries(&rounded, &period, note);

        if entries.is_empty() {
            info!(period = ?period.months(), "扣减金额全部为 0, 未过账");
            return Ok(DeductOutcome::NothingToDeduct);
        }

        self.ledger_repo
            .append_many_guarded(entries.clone(), |existing| {
                let conflicts = period_lock::conflicts(existing, &period);
                if conflicts.is_empty() {
                    Ok(())
                } else {
                    warn!(conflicts = ?conflicts, "扣减被拒绝: 月份已锁定");
                    Err(ApiError::LockConflict { months: conflicts })
                }
            })?;

        info!(
            op = %period.deduct_op(),
            start = %period.start(),
            entries = entries.len(),
            "扣减已过账"
        );
        Ok(DeductOutcome::Posted(entries))
    }

    /// 按下料方案的理想面积扣减
    ///
    /// 备注为空时使用默认备注（"Auto: kuu <月份> arvestus"）
    pub fn deduct_plan(
        &self,
        outcome: &PlanOutcome,
        period: MonthOrRange,
        note: Option<&str>,
    ) -> ApiResult<DeductOutcome> {
        let amounts: Vec<(Material, Decimal)> = Material::ALL
            .iter()
            .map(|m| (*m, outcome.ideal_area_for(*m)))
            .collect();

        let note = match note {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => i18n::t_with_args("deduct.auto_note", &[("period", &describe_period(&period))]),
        };
        self.try_deduct(&amounts, period, &note)
    }

    /// 解锁月份
    ///
    /// 删除覆盖该月的全部扣减记录（区间扣减整条删除, 其覆盖的其他月份一并解锁）
    ///
    /// # 返回
    /// - Ok(removed_count)
    pub fn unlock_month(&self, month: YearMonth) -> ApiResult<usize> {
        let ids: HashSet<String> = period_lock::deductions_covering(&self.ledger_repo.entries()?, month)
            .into_iter()
            .collect();
        if ids.is_empty() {
            info!(month = %month, "月份未锁定, 无需解锁");
            return Ok(0);
        }

        let removed = self.ledger_repo.delete(|entry| ids.contains(&entry.entry_id))?;
        info!(month = %month, removed, "月份已解锁");
        Ok(removed)
    }

    pub fn is_month_locked(&self, month: YearMonth) -> ApiResult<bool> {
        Ok(period_lock::is_locked(&self.ledger_repo.entries()?, month))
    }

    pub fn locked_months(&self) -> ApiResult<BTreeSet<YearMonth>> {
        Ok(self.ledger_repo.locked_months()?)
    }

    // ==========================================
    // 手工操作
    // ==========================================

    /// 手工入库（ADD）
    pub fn manual_add(
        &self,
        material: Material,
        amount_m2: Decimal,
        effective_date: NaiveDate,
        note: &str,
    ) -> ApiResult<LedgerEntry> {
        self.post_manual(material, LedgerOp::Add, amount_m2, effective_date, note)
    }

    /// 手工出库（SUB）
    pub fn manual_sub(
        &self,
        material: Material,
        amount_m2: Decimal,
        effective_date: NaiveDate,
        note: &str,
    ) -> ApiResult<LedgerEntry> {
        self.post_manual(material, LedgerOp::Sub, amount_m2, effective_date, note)
    }

    /// 设定余额（SET, 覆盖此前全部记录的累计结果）
    pub fn set_balance(
        &self,
        material: Material,
        amount_m2: Decimal,
        effective_date: NaiveDate,
        note: &str,
    ) -> ApiResult<LedgerEntry> {
        let entry = LedgerEntry::new(material, LedgerOp::Set, round_m2(amount_m2), effective_date)
            .with_note(note);
        self.ledger_repo.append(entry.clone())?;
        info!(material = %material, amount = %entry.amount_m2, "余额已设定");
        Ok(entry)
    }

    fn post_manual(
        &self,
        material: Material,
        op: LedgerOp,
        amount_m2: Decimal,
        effective_date: NaiveDate,
        note: &str,
    ) -> ApiResult<LedgerEntry> {
        let amount = round_m2(amount_m2);
        if amount <= Decimal::ZERO {
            return Err(ApiError::InvalidInput(format!(
                "{} 面积必须大于 0: {}",
                op, amount_m2
            )));
        }

        let entry = LedgerEntry::new(material, op, amount, effective_date).with_note(note);
        self.ledger_repo.append(entry.clone())?;
        info!(material = %material, op = %op, amount = %amount, "手工记录已过账");
        Ok(entry)
    }

    /// 撤销手工记录
    ///
    /// 追加一条反向记录（ADD ↔ SUB）, 原记录保留;
    /// 扣减记录只能通过解锁删除, SET 不可撤销
    pub fn undo_entry(&self, entry_id: &str) -> ApiResult<LedgerEntry> {
        let original = self
            .ledger_repo
            .find_by_id(entry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("LedgerEntry(id={})不存在", entry_id)))?;

        let inverse_op = match original.op {
            LedgerOp::Add => LedgerOp::Sub,
            LedgerOp::Sub => LedgerOp::Add,
            other => {
                return Err(ApiError::BusinessRuleViolation(i18n::t_with_args(
                    "ledger.undo_not_supported",
                    &[("op", other.as_str())],
                )))
            }
        };

        let note = i18n::t_with_args("ledger.undo_note", &[("entry_id", &original.entry_id)]);
        let inverse = LedgerEntry::new(
            original.material,
            inverse_op,
            original.amount_m2,
            original.effective_date,
        )
        .with_note(note);

        self.ledger_repo.append(inverse.clone())?;
        info!(entry_id = %entry_id, inverse_id = %inverse.entry_id, "记录已撤销");
        Ok(inverse)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 当前余额（未舍入, 展示时使用 BalanceSheet::rounded）
    pub fn balances(&self) -> ApiResult<BalanceSheet> {
        Ok(self.ledger_repo.recompute()?)
    }

    pub fn read(&self, filter: &LedgerFilter) -> ApiResult<Vec<LedgerEntry>> {
        Ok(self.ledger_repo.read(filter)?)
    }
}

fn validate_period(period: &MonthOrRange) -> ApiResult<()> {
    if let MonthOrRange::Range { from, to } = period {
        if from > to {
            return Err(ApiError::InvalidInput(format!(
                "期间起始月 {} 晚于结束月 {}",
                from, to
            )));
        }
    }
    Ok(())
}

fn describe_period(period: &MonthOrRange) -> String {
    match period {
        MonthOrRange::Month(m) => m.to_string(),
        MonthOrRange::Range { from, to } => format!("{}..{}", from, to),
    }
}
