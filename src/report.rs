// ==========================================
// Kumex 切割车间 - 下料方案报表
// ==========================================
// 输出目录: <state_dir>/reports/
// 每次计算写出:
// - summary_<ts>.csv / summary_<ts>.json  材料汇总
// - plan_layers_<ts>.csv                  层明细（条带宽度空格分隔）
// - issues_<ts>.csv                       不可排订单项
// - plan_<ts>.json                        完整方案
// ==========================================
// 红线: 只新增文件, 不覆盖历史报表（时间戳 + 冲突序号）
// ==========================================

use crate::domain::ledger::round_m2;
use crate::domain::plan::PlanOutcome;
use chrono::Local;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const REPORTS_DIR_NAME: &str = "reports";

const SUMMARY_HEADER: &[&str] = &[
    "material",
    "plates_used",
    "m2_used",
    "plates_left",
    "m2_left",
    "layers_used",
    "layers_per_plate",
    "ideal_area_m2",
    "waste_width_area_m2",
    "thickness_waste_mm3",
];
const LAYER_HEADER: &[&str] = &["material", "layer_id", "remaining_width_mm", "strip_widths"];
const ISSUE_HEADER: &[&str] = &["material", "dims", "uom", "qty", "issue_code", "issue_detail"];

/// 报表错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("报表文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

// ==========================================
// 报表行
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub material: String,
    pub plates_used: i64,
    pub m2_used: Decimal,
    pub plates_left: i64,
    pub m2_left: Decimal,
    pub layers_used: usize,
    pub layers_per_plate: u32,
    pub ideal_area_m2: Decimal,
    pub waste_width_area_m2: Decimal,
    pub thickness_waste_mm3: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerRow {
    pub material: String,
    pub layer_id: usize,
    pub remaining_width_mm: Decimal,
    pub strip_widths: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub material: String,
    pub dims: String,
    pub uom: String,
    pub qty: i64,
    pub issue_code: String,
    pub issue_detail: String,
}

/// 本次写出的报表文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFiles {
    pub summary_csv: PathBuf,
    pub summary_json: PathBuf,
    pub layers_csv: PathBuf,
    pub issues_csv: PathBuf,
    pub plan_json: PathBuf,
}

impl ReportFiles {
    pub fn all(&self) -> [&Path; 5] {
        [
            &self.summary_csv,
            &self.summary_json,
            &self.layers_csv,
            &self.issues_csv,
            &self.plan_json,
        ]
    }
}

// ==========================================
// 行构造
// ==========================================

/// 材料汇总行（面积保留 2 位小数）
pub fn summary_rows(outcome: &PlanOutcome) -> Vec<SummaryRow> {
    outcome
        .plans
        .iter()
        .map(|p| SummaryRow {
            material: p.material.to_string(),
            plates_used: p.plates_used,
            m2_used: round_m2(p.m2_used),
            plates_left: p.plates_left,
            m2_left: round_m2(p.m2_left),
            layers_used: p.layers_used,
            layers_per_plate: p.layers_per_plate,
            ideal_area_m2: round_m2(p.ideal_area_m2),
            waste_width_area_m2: round_m2(p.waste_width_area_m2),
            thickness_waste_mm3: p.thickness_waste_mm3.normalize(),
        })
        .collect()
}

/// 层明细行
pub fn layer_rows(outcome: &PlanOutcome) -> Vec<LayerRow> {
    outcome
        .plans
        .iter()
        .flat_map(|p| {
            p.layers.iter().map(move |layer| LayerRow {
                material: p.material.to_string(),
                layer_id: layer.id,
                remaining_width_mm: layer.remaining_width_mm.normalize(),
                strip_widths: layer
                    .strip_widths
                    .iter()
                    .map(|w| w.normalize().to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
            })
        })
        .collect()
}

/// 问题行
pub fn issue_rows(outcome: &PlanOutcome) -> Vec<IssueRow> {
    outcome
        .issues
        .iter()
        .map(|issue| IssueRow {
            material: issue.material.to_string(),
            dims: issue
                .dimensions
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("x"),
            uom: issue.quantity_unit.to_string(),
            qty: issue.quantity,
            issue_code: issue.code.to_string(),
            issue_detail: issue.detail.clone(),
        })
        .collect()
}

// ==========================================
// ReportWriter - 报表写出
// ==========================================
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// <state_dir>/reports
    pub fn in_state_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(REPORTS_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 写出一次计算的全部报表
    pub fn write(&self, outcome: &PlanOutcome) -> ReportResult<ReportFiles> {
        fs::create_dir_all(&self.dir)?;
        let files = self.next_files();

        let summary = summary_rows(outcome);
        write_csv(&files.summary_csv, SUMMARY_HEADER, &summary)?;
        fs::write(&files.summary_json, serde_json::to_string_pretty(&summary)?)?;
        write_csv(&files.layers_csv, LAYER_HEADER, &layer_rows(outcome))?;
        write_csv(&files.issues_csv, ISSUE_HEADER, &issue_rows(outcome))?;
        fs::write(&files.plan_json, serde_json::to_string_pretty(outcome)?)?;

        tracing::info!(
            dir = %self.dir.display(),
            summary = %files.summary_csv.display(),
            issues = outcome.issues.len(),
            "报表已写出"
        );
        Ok(files)
    }

    /// 下一组不冲突的文件名
    fn next_files(&self) -> ReportFiles {
        let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut suffix = ts.clone();
        let mut counter = 1;

        loop {
            let files = self.files_for(&suffix);
            if files.all().iter().all(|p| !p.exists()) {
                return files;
            }
            suffix = format!("{}_{}", ts, counter);
            counter += 1;
        }
    }

    fn files_for(&self, suffix: &str) -> ReportFiles {
        ReportFiles {
            summary_csv: self.dir.join(format!("summary_{}.csv", suffix)),
            summary_json: self.dir.join(format!("summary_{}.json", suffix)),
            layers_csv: self.dir.join(format!("plan_layers_{}.csv", suffix)),
            issues_csv: self.dir.join(format!("issues_{}.csv", suffix)),
            plan_json: self.dir.join(format!("plan_{}.json", suffix)),
        }
    }
}

/// 写 CSV（表头显式写出, 无数据行时也保留表头）
fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> ReportResult<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::plan_constants::PlanConstants;
    use crate::domain::order::OrderItem;
    use crate::domain::types::{Material, QuantityUnit};
    use crate::engine::allocator::CuttingPlanAllocator;
    use tempfile::TempDir;

    fn sample_outcome() -> PlanOutcome {
        let alloc = CuttingPlanAllocator::new(PlanConstants::default()).unwrap();
        let items = vec![
            OrderItem::new(Material::PomValge, [1000, 52, 22], 70, QuantityUnit::Pieces),
            OrderItem::new(Material::PomMust, [1000, 52, 22], 0, QuantityUnit::Pieces),
        ];
        alloc.plan_all(&items, Decimal::ONE).unwrap()
    }

    #[test]
    fn test_summary_rows_rounded() {
        let rows = summary_rows(&sample_outcome());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].material, "POM Valge");
        assert_eq!(rows[0].ideal_area_m2.to_string(), "1.61");
        assert_eq!(rows[0].plates_used, 1);
        assert_eq!(rows[1].plates_left, 10);
    }

    #[test]
    fn test_layer_rows_join_strip_widths() {
        let rows = layer_rows(&sample_outcome());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].layer_id, 2);
        assert_eq!(rows[1].remaining_width_mm.to_string(), "379");
        assert!(rows[1].strip_widths.starts_with("23 23"));
    }

    #[test]
    fn test_write_creates_all_files_without_overwriting() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::in_state_dir(dir.path());
        let outcome = sample_outcome();

        let first = writer.write(&outcome).unwrap();
        let second = writer.write(&outcome).unwrap();

        for path in first.all().iter().chain(second.all().iter()) {
            assert!(path.exists(), "missing {}", path.display());
        }
        assert_ne!(first.summary_csv, second.summary_csv);

        let issues = fs::read_to_string(&first.issues_csv).unwrap();
        assert!(issues.starts_with("material,dims,uom,qty,issue_code,issue_detail"));
        assert!(issues.contains("QTY_NON_POSITIVE"));
    }

    #[test]
    fn test_empty_issues_still_has_header() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::in_state_dir(dir.path());
        let outcome = PlanOutcome {
            plans: Vec::new(),
            issues: Vec::new(),
        };

        let files = writer.write(&outcome).unwrap();

        let issues = fs::read_to_string(&files.issues_csv).unwrap();
        assert_eq!(issues.trim(), "material,dims,uom,qty,issue_code,issue_detail");
    }
}
