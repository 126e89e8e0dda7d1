// ==========================================
// Kumex 切割车间 - 订单行规范化引擎
// ==========================================
// 输入: 外部文本抽取交付的原始订单行
// 输出: OrderItem 列表 + 尺寸缺失的 Issue
// ==========================================
// 注: 数量单位推断是尽力而为的启发式
// - 数量 >= 阈值（默认 1000）视为总长度 (mm)
// - 描述或数量上下文中出现 "<数量> mm" 时强制视为长度
// - 临界值存在歧义, 阈值可配置但不得静默修改判定边界
// ==========================================

use crate::domain::order::{OrderItem, RawOrderLine, ScanResult};
use crate::domain::plan::Issue;
use crate::domain::types::{IssueCode, Material, QuantityUnit};
use crate::i18n;
use regex::Regex;
use std::sync::LazyLock;

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid regex"));

// ==========================================
// OrderNormalizer - 订单行规范化
// ==========================================
pub struct OrderNormalizer {
    length_unit_threshold: i64,
}

impl OrderNormalizer {
    /// 构造函数
    ///
    /// # 参数
    /// - `length_unit_threshold`: 数量 >= 该值时视为长度 (mm)
    pub fn new(length_unit_threshold: i64) -> Self {
        Self {
            length_unit_threshold,
        }
    }

    /// 规范化一批原始订单行
    ///
    /// 未跟踪材料的行被跳过（计入 skipped_lines）
    pub fn normalize_all(&self, lines: &[RawOrderLine]) -> ScanResult {
        let mut result = ScanResult::default();

        for line in lines {
            let Some(material) = Material::classify(&line.description) else {
                tracing::debug!(description = %line.description, "未跟踪材料, 跳过");
                result.skipped_lines += 1;
                continue;
            };

            match self.normalize(material, line) {
                Ok(item) => result.items.push(item),
                Err(issue) => result.issues.push(issue),
            }
        }

        tracing::info!(
            items = result.items.len(),
            issues = result.issues.len(),
            skipped = result.skipped_lines,
            "订单行规范化完成"
        );
        result
    }

    /// 规范化单行
    ///
    /// # 返回
    /// - Ok(OrderItem): 三个尺寸齐全
    /// - Err(Issue): 尺寸不足三项（按 NO_DIM_LE_BASE_THICKNESS 处理）
    pub fn normalize(&self, material: Material, line: &RawOrderLine) -> Result<OrderItem, Issue> {
        let unit = self.infer_unit(line);
        let dims = extract_dimensions(&line.description);

        let Some(dimensions) = dims else {
            return Err(Issue {
                material,
                dimensions: all_numbers(&line.description),
                quantity_unit: unit,
                quantity: line.quantity,
                code: IssueCode::NoDimLeBaseThickness,
                detail: i18n::t("issue.need_three_dimensions"),
            });
        };

        Ok(OrderItem {
            material,
            dimensions,
            quantity: line.quantity,
            quantity_unit: unit,
            source_description: line.description.clone(),
        })
    }

    /// 推断数量单位
    pub fn infer_unit(&self, line: &RawOrderLine) -> QuantityUnit {
        if line.quantity >= self.length_unit_threshold {
            return QuantityUnit::LengthMm;
        }

        let context = format!("{}\n{}", line.description, line.quantity_context);
        if has_mm_marker(&context, line.quantity) {
            return QuantityUnit::LengthMm;
        }
        QuantityUnit::Pieces
    }
}

/// 描述中全部整数（原始顺序, 超出 u32 的忽略）
fn all_numbers(description: &str) -> Vec<u32> {
    NUMBER_RE
        .find_iter(description)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .collect()
}

/// 取描述中最大的三个正整数（降序）
///
/// 少于三个时返回 None
pub fn extract_dimensions(description: &str) -> Option<[u32; 3]> {
    let mut nums: Vec<u32> = all_numbers(description).into_iter().filter(|n| *n > 0).collect();
    if nums.len() < 3 {
        return None;
    }
    nums.sort_unstable_by(|a, b| b.cmp(a));
    Some([nums[0], nums[1], nums[2]])
}

/// 上下文中是否出现 "<qty> mm" 单位标记（大小写不敏感）
fn has_mm_marker(context: &str, quantity: i64) -> bool {
    let pattern = format!(r"(?i)\b{}\s*mm\b", quantity);
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(context),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> OrderNormalizer {
        OrderNormalizer::new(1000)
    }

    #[test]
    fn test_extract_three_largest() {
        assert_eq!(extract_dimensions("POM Valge 22x52x1000"), Some([1000, 52, 22]));
        assert_eq!(extract_dimensions("POM 2 tk 40*67*1000 mm"), Some([1000, 67, 40]));
        assert_eq!(extract_dimensions("POM Valge 20x20"), None);
    }

    #[test]
    fn test_unit_by_threshold() {
        let n = normalizer();
        assert_eq!(n.infer_unit(&RawOrderLine::new("POM Valge 22x22x1000", 999)), QuantityUnit::Pieces);
        assert_eq!(n.infer_unit(&RawOrderLine::new("POM Valge 22x22x1000", 1000)), QuantityUnit::LengthMm);
        assert_eq!(n.infer_unit(&RawOrderLine::new("POM Valge 22x22x1000", 2000)), QuantityUnit::LengthMm);
    }

    #[test]
    fn test_mm_marker_forces_length() {
        let n = normalizer();
        let line = RawOrderLine::new("POM Must 10x20x30", 500).with_context("Qty 500 mm");
        assert_eq!(n.infer_unit(&line), QuantityUnit::LengthMm);

        // 其他数字后的 mm 不影响判断
        let line = RawOrderLine::new("POM Must 10x20x30 mm", 500).with_context("Qty 500");
        assert_eq!(n.infer_unit(&line), QuantityUnit::Pieces);
    }

    #[test]
    fn test_threshold_is_configurable() {
        let n = OrderNormalizer::new(5000);
        assert_eq!(n.infer_unit(&RawOrderLine::new("POM Valge 22x22x1000", 2000)), QuantityUnit::Pieces);
    }

    #[test]
    fn test_normalize_all_skips_untracked_and_reports_missing_dims() {
        let n = normalizer();
        let lines = vec![
            RawOrderLine::new("POM Valge 22x52x1000", 70),
            RawOrderLine::new("PET 10x10x10", 5),
            RawOrderLine::new("POM Must 20x20", 3),
        ];
        let result = n.normalize_all(&lines);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].material, Material::PomValge);
        assert_eq!(result.items[0].dimensions, [1000, 52, 22]);
        assert_eq!(result.skipped_lines, 1);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].code, IssueCode::NoDimLeBaseThickness);
        assert_eq!(result.issues[0].dimensions, vec![20, 20]);
    }
}
