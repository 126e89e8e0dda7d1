// ==========================================
// Kumex 切割车间 - 下料方案 API
// ==========================================
// 职责: 订单行扫描 → 下料方案 → 审计报表
// 红线: 方案只在调用时显式计算, 台账变更不触发重算
// ==========================================

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::plan_constants::PlanConstants;
use crate::domain::order::{OrderItem, RawOrderLine, ScanResult};
use crate::domain::plan::PlanOutcome;
use crate::domain::types::Material;
use crate::engine::allocator::CuttingPlanAllocator;
use crate::engine::normalizer::OrderNormalizer;
use crate::report::{ReportFiles, ReportWriter};

// ==========================================
// PlanRun - 一次完整计算的结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct PlanRun {
    pub kerf_mm: Decimal,
    pub skipped_lines: usize,
    pub outcome: PlanOutcome,
    pub reports: Option<ReportFiles>,
}

// ==========================================
// PlanApi - 下料方案 API
// ==========================================

/// 下料方案API
///
/// 职责：
/// 1. 原始订单行规范化（材料识别、尺寸、数量单位）
/// 2. 按材料计算下料方案（同步 / 按材料并行）
/// 3. 写出审计报表
pub struct PlanApi {
    allocator: Arc<CuttingPlanAllocator>,
    normalizer: OrderNormalizer,
    config_manager: Arc<ConfigManager>,
    report_writer: ReportWriter,
}

impl PlanApi {
    /// 创建新的PlanApi实例
    ///
    /// # 返回
    /// - Err(InvalidConfig): 固定常量无效
    pub fn new(
        constants: PlanConstants,
        config_manager: Arc<ConfigManager>,
        report_writer: ReportWriter,
    ) -> ApiResult<Self> {
        let normalizer = OrderNormalizer::new(constants.length_unit_threshold);
        let allocator = CuttingPlanAllocator::new(constants)?;
        Ok(Self {
            allocator: Arc::new(allocator),
            normalizer,
            config_manager,
            report_writer,
        })
    }

    pub fn constants(&self) -> &PlanConstants {
        self.allocator.constants()
    }

    /// 规范化原始订单行
    pub fn scan(&self, lines: &[RawOrderLine]) -> ScanResult {
        self.normalizer.normalize_all(lines)
    }

    /// 计算全部材料的方案
    pub fn plan(&self, items: &[OrderItem], kerf_mm: Decimal) -> ApiResult<PlanOutcome> {
        Ok(self.allocator.plan_all(items, kerf_mm)?)
    }

    /// 按材料并行计算（结果与 plan 相同）
    ///
    /// 每个材料在 spawn_blocking 中计算, 结果按 Material::ALL 顺序合并
    #[instrument(skip(self, items), fields(items_count = items.len()))]
    pub async fn plan_all_parallel(&self, items: &[OrderItem], kerf_mm: Decimal) -> ApiResult<PlanOutcome> {
        let tasks = Material::ALL.iter().map(|material| {
            let material = *material;
            let allocator = Arc::clone(&self.allocator);
            let material_items: Vec<OrderItem> = items
                .iter()
                .filter(|item| item.material == material)
                .cloned()
                .collect();
            tokio::task::spawn_blocking(move || allocator.plan(material, &material_items, kerf_mm))
        });

        let mut outcome = PlanOutcome {
            plans: Vec::with_capacity(Material::ALL.len()),
            issues: Vec::new(),
        };
        for joined in join_all(tasks).await {
            let (plan, mut issues) = joined
                .map_err(|e| ApiError::InternalError(format!("方案计算任务失败: {}", e)))??;
            outcome.plans.push(plan);
            outcome.issues.append(&mut issues);
        }
        Ok(outcome)
    }

    /// 写出报表
    pub fn write_reports(&self, outcome: &PlanOutcome) -> ApiResult<ReportFiles> {
        self.report_writer
            .write(outcome)
            .map_err(|e| ApiError::ReportError(e.to_string()))
    }

    /// 扫描 + 计算 + 报表
    ///
    /// # 参数
    /// - `lines`: 原始订单行
    /// - `kerf_mm`: 锯缝宽度; None 时使用配置文档中的值
    /// - `write_reports`: 是否写出报表
    ///
    /// 扫描阶段的 Issue 排在方案 Issue 之前
    pub fn run(
        &self,
        lines: &[RawOrderLine],
        kerf_mm: Option<Decimal>,
        write_reports: bool,
    ) -> ApiResult<PlanRun> {
        let kerf_mm = match kerf_mm {
            Some(k) => k,
            None => self.config_manager.load().effective_kerf_mm(),
        };

        let scan = self.scan(lines);
        let mut outcome = self.plan(&scan.items, kerf_mm)?;
        if !scan.issues.is_empty() {
            let mut issues = scan.issues;
            issues.append(&mut outcome.issues);
            outcome.issues = issues;
        }

        for plan in &outcome.plans {
            info!(
                material = %plan.material,
                layers = plan.layers_used,
                plates_used = plan.plates_used,
                plates_left = plan.plates_left,
                ideal_m2 = %plan.ideal_area_m2,
                "方案计算完成"
            );
        }
        if !outcome.issues.is_empty() {
            warn!(issues = outcome.issues.len(), "存在不可排订单项");
        }

        let reports = if write_reports {
            Some(self.write_reports(&outcome)?)
        } else {
            None
        };

        Ok(PlanRun {
            kerf_mm,
            skipped_lines: scan.skipped_lines,
            outcome,
            reports,
        })
    }
}

/// 读取订单行 CSV
///
/// 列: description, quantity, quantity_context, po_number, order_date
/// （后三列可省略）
pub fn read_order_lines(path: &Path) -> ApiResult<Vec<RawOrderLine>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ApiError::InvalidInput(format!("{}: {}", path.display(), e)))?;

    let mut lines = Vec::new();
    for (row_idx, result) in reader.deserialize::<RawOrderLine>().enumerate() {
        let row_number = row_idx + 2; // 跳过表头
        let line = result
            .map_err(|e| ApiError::InvalidInput(format!("第 {} 行格式错误: {}", row_number, e)))?;
        lines.push(line);
    }
    Ok(lines)
}
