// ==========================================
// Kumex 切割车间 - 材料台账领域模型
// ==========================================
// 红线: 台账只追加, 记录不可修改、不可重排
// 更正方式: 追加反向记录, 或删除指定记录后全量重算
// ==========================================

use crate::domain::types::{LedgerOp, Material, YearMonth};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 面积统一保留 2 位小数, 四舍五入（half-up）
pub fn round_m2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ==========================================
// PeriodCovered - 扣减覆盖期间
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodCovered {
    /// 单月
    Month { month: YearMonth },
    /// 闭区间 + 展开后的月份列表
    Range {
        from: YearMonth,
        to: YearMonth,
        months: Vec<YearMonth>,
    },
}

impl PeriodCovered {
    pub fn month(month: YearMonth) -> Self {
        PeriodCovered::Month { month }
    }

    /// 区间（自动展开月份）
    pub fn range(from: YearMonth, to: YearMonth) -> Self {
        PeriodCovered::Range {
            from,
            to,
            months: YearMonth::range_inclusive(from, to),
        }
    }

    /// 覆盖的全部月份
    pub fn months(&self) -> Vec<YearMonth> {
        match self {
            PeriodCovered::Month { month } => vec![*month],
            PeriodCovered::Range { months, .. } => months.clone(),
        }
    }

    pub fn contains(&self, month: YearMonth) -> bool {
        match self {
            PeriodCovered::Month { month: m } => *m == month,
            PeriodCovered::Range { months, .. } => months.contains(&month),
        }
    }
}

// ==========================================
// MonthOrRange - 扣减请求期间
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthOrRange {
    Month(YearMonth),
    Range { from: YearMonth, to: YearMonth },
}

impl MonthOrRange {
    /// 请求覆盖的全部月份
    pub fn months(&self) -> Vec<YearMonth> {
        match self {
            MonthOrRange::Month(m) => vec![*m],
            MonthOrRange::Range { from, to } => YearMonth::range_inclusive(*from, *to),
        }
    }

    /// 期间起始月（作为扣减记录的 effective_date）
    pub fn start(&self) -> YearMonth {
        match self {
            MonthOrRange::Month(m) => *m,
            MonthOrRange::Range { from, .. } => *from,
        }
    }

    pub fn to_period(&self) -> PeriodCovered {
        match self {
            MonthOrRange::Month(m) => PeriodCovered::month(*m),
            MonthOrRange::Range { from, to } => PeriodCovered::range(*from, *to),
        }
    }

    /// 对应的台账操作类型
    pub fn deduct_op(&self) -> LedgerOp {
        match self {
            MonthOrRange::Month(_) => LedgerOp::MonthDeduct,
            MonthOrRange::Range { .. } => LedgerOp::PeriodDeduct,
        }
    }
}

// ==========================================
// LedgerEntry - 台账记录
// ==========================================
// created_at: 插入顺序键（不等于业务日期）
// effective_date: 报表/期间过滤归属日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: String,
    pub created_at: NaiveDateTime,
    pub effective_date: NaiveDate,
    pub material: Material,
    pub op: LedgerOp,
    pub amount_m2: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_covered: Option<PeriodCovered>,
    #[serde(default)]
    pub note: String,
}

impl LedgerEntry {
    /// 创建新记录（生成 entry_id 与 created_at）
    pub fn new(material: Material, op: LedgerOp, amount_m2: Decimal, effective_date: NaiveDate) -> Self {
        Self {
            entry_id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Local::now().naive_local(),
            effective_date,
            material,
            op,
            amount_m2,
            period_covered: None,
            note: String::new(),
        }
    }

    pub fn with_period(mut self, period: PeriodCovered) -> Self {
        self.period_covered = Some(period);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// effective_date 所在月份
    pub fn effective_month(&self) -> YearMonth {
        YearMonth::of_date(self.effective_date)
    }

    /// 扣减记录锁定的月份（非扣减记录为空）
    ///
    /// 旧文档中扣减记录缺少 period_covered 时, 退回到 effective_date 所在月
    pub fn locked_months(&self) -> Vec<YearMonth> {
        if !self.op.is_deduction() {
            return Vec::new();
        }
        match &self.period_covered {
            Some(period) => period.months(),
            None => vec![self.effective_month()],
        }
    }
}

// ==========================================
// BalanceSheet - 余额投影
// ==========================================
// 派生数据, 非权威来源; 内部保持未舍入精度
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSheet {
    balances: BTreeMap<Material, Decimal>,
}

impl BalanceSheet {
    /// 全部跟踪材料余额为 0
    pub fn zero() -> Self {
        Self {
            balances: Material::ALL.iter().map(|m| (*m, Decimal::ZERO)).collect(),
        }
    }

    pub fn get(&self, material: Material) -> Decimal {
        self.balances.get(&material).copied().unwrap_or(Decimal::ZERO)
    }

    /// 展示/持久化用（2 位小数）
    pub fn rounded(&self, material: Material) -> Decimal {
        round_m2(self.get(material))
    }

    pub(crate) fn entry_mut(&mut self, material: Material) -> &mut Decimal {
        self.balances.entry(material).or_insert(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Material, &Decimal)> {
        self.balances.iter()
    }

    /// 余额为负的材料
    pub fn negatives(&self) -> Vec<Material> {
        self.balances
            .iter()
            .filter(|(_, v)| v.is_sign_negative() && !v.is_zero())
            .map(|(m, _)| *m)
            .collect()
    }
}

impl Default for BalanceSheet {
    fn default() -> Self {
        Self::zero()
    }
}

// ==========================================
// LedgerFilter - 台账查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerFilter {
    pub material: Option<Material>,
    pub op: Option<LedgerOp>,
    pub month: Option<YearMonth>, // effective_date 所在月
    pub year: Option<i32>,        // effective_date 所在年
}

impl LedgerFilter {
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        if let Some(material) = self.material {
            if entry.material != material {
                return false;
            }
        }
        if let Some(op) = self.op {
            if entry.op != op {
                return false;
            }
        }
        if let Some(month) = self.month {
            if entry.effective_month() != month {
                return false;
            }
        }
        if let Some(year) = self.year {
            if entry.effective_month().year() != year {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_round_m2_half_up() {
        assert_eq!(round_m2(Decimal::from_str("1.605").unwrap()), Decimal::from_str("1.61").unwrap());
        assert_eq!(round_m2(Decimal::from_str("1.604").unwrap()), Decimal::from_str("1.60").unwrap());
        assert_eq!(round_m2(Decimal::from_str("-0.125").unwrap()), Decimal::from_str("-0.13").unwrap());
    }

    #[test]
    fn test_period_range_expands_months() {
        let from = YearMonth::parse("2025-02").unwrap();
        let to = YearMonth::parse("2025-04").unwrap();
        let period = PeriodCovered::range(from, to);
        assert_eq!(period.months().len(), 3);
        assert!(period.contains(YearMonth::parse("2025-03").unwrap()));
        assert!(!period.contains(YearMonth::parse("2025-05").unwrap()));
    }

    #[test]
    fn test_locked_months_only_for_deductions() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let add = LedgerEntry::new(Material::PomValge, LedgerOp::Add, Decimal::ONE, date);
        assert!(add.locked_months().is_empty());

        // 缺少 period_covered 的旧扣减记录退回到 effective_date 所在月
        let legacy = LedgerEntry::new(Material::PomValge, LedgerOp::MonthDeduct, Decimal::ONE, date);
        assert_eq!(legacy.locked_months(), vec![YearMonth::parse("2025-01").unwrap()]);
    }

    #[test]
    fn test_ledger_entry_json_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let entry = LedgerEntry::new(Material::PomMust, LedgerOp::MonthDeduct, Decimal::from_str("1.50").unwrap(), date)
            .with_period(PeriodCovered::month(YearMonth::parse("2025-01").unwrap()));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["op"], "MONTH_DEDUCT");
        assert_eq!(json["material"], "POM Must");
        assert_eq!(json["amount_m2"], "1.50");
        assert_eq!(json["period_covered"]["kind"], "MONTH");
        assert_eq!(json["period_covered"]["month"], "2025-01");
    }

    #[test]
    fn test_filter_by_month_and_material() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let feb = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let a = LedgerEntry::new(Material::PomValge, LedgerOp::Add, Decimal::ONE, jan);
        let b = LedgerEntry::new(Material::PomMust, LedgerOp::Add, Decimal::ONE, feb);

        let filter = LedgerFilter {
            month: Some(YearMonth::parse("2025-01").unwrap()),
            ..LedgerFilter::default()
        };
        assert!(filter.matches(&a));
        assert!(!filter.matches(&b));

        let filter = LedgerFilter {
            material: Some(Material::PomMust),
            year: Some(2025),
            ..LedgerFilter::default()
        };
        assert!(!filter.matches(&a));
        assert!(filter.matches(&b));
    }
}
