// ==========================================
// Kumex 切割车间 - 领域类型定义
// ==========================================
// 依据: 材料种类 / 数量单位 / 台账操作 / 问题代码
// 序列化格式: SCREAMING_SNAKE_CASE (与库存文档一致)
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 材料种类 (Material)
// ==========================================
// 红线: 只跟踪显式配置的材料, 台账折叠与下料必须穷举
// 扩展新材料: 增加枚举值 + ALL + as_str/from_str
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Material {
    #[serde(rename = "POM Valge")]
    PomValge, // 白色 POM
    #[serde(rename = "POM Must")]
    PomMust, // 黑色 POM
}

impl Material {
    /// 全部跟踪材料（固定顺序，报表与折叠按此顺序输出）
    pub const ALL: [Material; 2] = [Material::PomValge, Material::PomMust];

    /// 库存文档中的材料名
    pub fn as_str(&self) -> &'static str {
        match self {
            Material::PomValge => "POM Valge",
            Material::PomMust => "POM Must",
        }
    }

    /// 从材料名解析（大小写不敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pom valge" => Some(Material::PomValge),
            "pom must" => Some(Material::PomMust),
            _ => None,
        }
    }

    /// 从订单描述识别材料
    ///
    /// 规则：
    /// - 含 "pom" 且含 "valge" → POM Valge
    /// - 含 "pom" 且含 "must" 或 "õhuke" → POM Must
    /// - 其余（PET、黄铜、仅 ESD 等）不计入
    pub fn classify(description: &str) -> Option<Self> {
        let d = description.to_lowercase();
        if !d.contains("pom") {
            return None;
        }
        if d.contains("valge") {
            Some(Material::PomValge)
        } else if d.contains("must") || d.contains("õhuke") {
            Some(Material::PomMust)
        } else {
            None
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 数量单位 (Quantity Unit)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantityUnit {
    Pieces,   // 件数
    LengthMm, // 总长度 (mm)
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantityUnit::Pieces => write!(f, "PIECES"),
            QuantityUnit::LengthMm => write!(f, "LENGTH_MM"),
        }
    }
}

// ==========================================
// 问题代码 (Issue Code)
// ==========================================
// 输入缺陷: 以 Issue 记录上报, 批次继续
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    QtyNonPositive,        // 数量非正
    NoDimLeBaseThickness,  // 没有不超过基准厚度的尺寸 / 尺寸不足三项
    NoFeasibleOrientation, // 无可行摆放方向
    WidthExceedsPlate,     // 宽度超过板宽
    QtyTooLarge,           // 条带数超过单项上限
}

impl IssueCode {
    /// i18n 文案键
    pub fn message_key(&self) -> &'static str {
        match self {
            IssueCode::QtyNonPositive => "issue.qty_non_positive",
            IssueCode::NoDimLeBaseThickness => "issue.no_dim_le_base_thickness",
            IssueCode::NoFeasibleOrientation => "issue.no_feasible_orientation",
            IssueCode::WidthExceedsPlate => "issue.width_exceeds_plate",
            IssueCode::QtyTooLarge => "issue.qty_too_large",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCode::QtyNonPositive => write!(f, "QTY_NON_POSITIVE"),
            IssueCode::NoDimLeBaseThickness => write!(f, "NO_DIM_LE_BASE_THICKNESS"),
            IssueCode::NoFeasibleOrientation => write!(f, "NO_FEASIBLE_ORIENTATION"),
            IssueCode::WidthExceedsPlate => write!(f, "WIDTH_EXCEEDS_PLATE"),
            IssueCode::QtyTooLarge => write!(f, "QTY_TOO_LARGE"),
        }
    }
}

// ==========================================
// 台账操作 (Ledger Op)
// ==========================================
// 折叠规则:
// ADD → +amount; SUB → -amount; SET → :=amount;
// MONTH_DEDUCT / PERIOD_DEDUCT → -amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerOp {
    Add,
    Sub,
    Set,
    MonthDeduct,
    PeriodDeduct,
}

impl LedgerOp {
    /// 是否为期间扣减（参与期间锁定）
    pub fn is_deduction(&self) -> bool {
        matches!(self, LedgerOp::MonthDeduct | LedgerOp::PeriodDeduct)
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ADD" => Some(LedgerOp::Add),
            "SUB" => Some(LedgerOp::Sub),
            "SET" => Some(LedgerOp::Set),
            "MONTH_DEDUCT" => Some(LedgerOp::MonthDeduct),
            "PERIOD_DEDUCT" => Some(LedgerOp::PeriodDeduct),
            _ => None,
        }
    }

    /// 转换为文档存储的字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerOp::Add => "ADD",
            LedgerOp::Sub => "SUB",
            LedgerOp::Set => "SET",
            LedgerOp::MonthDeduct => "MONTH_DEDUCT",
            LedgerOp::PeriodDeduct => "PERIOD_DEDUCT",
        }
    }
}

impl fmt::Display for LedgerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 年月 (YearMonth)
// ==========================================
// 文档格式: "YYYY-MM"; 按时间先后排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// 构造（月份必须在 1..=12）
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// 解析 "YYYY-MM"
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.trim().split_once('-')?;
        if y.len() != 4 || m.len() != 2 {
            return None;
        }
        let year = y.parse::<i32>().ok()?;
        let month = m.parse::<u32>().ok()?;
        Self::new(year, month)
    }

    /// 日期所在月份
    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 当月第一天
    pub fn first_day(&self) -> NaiveDate {
        // year/month 已在构造时校验
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// 下一个月
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// 展开闭区间 [from, to] 内的全部月份
    ///
    /// from > to 时返回空列表
    pub fn range_inclusive(from: YearMonth, to: YearMonth) -> Vec<YearMonth> {
        let mut months = Vec::new();
        let mut cur = from;
        while cur <= to {
            months.push(cur);
            cur = cur.next();
        }
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        YearMonth::parse(&value).ok_or_else(|| format!("月份格式错误, 期望 YYYY-MM, 实际 {}", value))
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_classify() {
        assert_eq!(Material::classify("POM Valge 22x22x1000"), Some(Material::PomValge));
        assert_eq!(Material::classify("pom MUST 40*67*1000"), Some(Material::PomMust));
        assert_eq!(Material::classify("POM õhuke 10x20x30"), Some(Material::PomMust));
        assert_eq!(Material::classify("PET valge 10x20x30"), None);
        assert_eq!(Material::classify("POM ESD 10x20x30"), None);
    }

    #[test]
    fn test_material_serde_name() {
        let json = serde_json::to_string(&Material::PomValge).unwrap();
        assert_eq!(json, "\"POM Valge\"");
        let back: Material = serde_json::from_str("\"POM Must\"").unwrap();
        assert_eq!(back, Material::PomMust);
    }

    #[test]
    fn test_year_month_parse_and_display() {
        let ym = YearMonth::parse("2025-01").unwrap();
        assert_eq!(ym.year(), 2025);
        assert_eq!(ym.month(), 1);
        assert_eq!(ym.to_string(), "2025-01");

        assert!(YearMonth::parse("2025-13").is_none());
        assert!(YearMonth::parse("2025-1").is_none());
        assert!(YearMonth::parse("garbage").is_none());
    }

    #[test]
    fn test_year_month_range_crosses_year() {
        let from = YearMonth::parse("2024-11").unwrap();
        let to = YearMonth::parse("2025-02").unwrap();
        let months: Vec<String> = YearMonth::range_inclusive(from, to)
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);

        assert!(YearMonth::range_inclusive(to, from).is_empty());
    }

    #[test]
    fn test_ledger_op_roundtrip_names() {
        for op in [
            LedgerOp::Add,
            LedgerOp::Sub,
            LedgerOp::Set,
            LedgerOp::MonthDeduct,
            LedgerOp::PeriodDeduct,
        ] {
            assert_eq!(LedgerOp::from_str(op.as_str()), Some(op));
        }
        assert!(LedgerOp::MonthDeduct.is_deduction());
        assert!(!LedgerOp::Set.is_deduction());
    }
}
