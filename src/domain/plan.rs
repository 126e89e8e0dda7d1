// ==========================================
// Kumex 切割车间 - 下料方案领域模型
// ==========================================
// 职责: 条带 / 层 / 板 的方案结构 + 不可排问题
// 红线: 每次计算完整重建, 不做局部修改
// ==========================================

use crate::domain::types::{IssueCode, Material, QuantityUnit};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Layer - 层
// ==========================================
// 一层 = 在板宽内并排放置的若干条带
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: usize,                    // 层号（从 1 开始）
    pub strip_widths: Vec<Decimal>,   // 条带宽度 (mm), 按放入顺序
    pub remaining_width_mm: Decimal,  // 剩余宽度 (mm)
}

impl Layer {
    /// 已用宽度
    pub fn used_width_mm(&self) -> Decimal {
        self.strip_widths.iter().copied().sum()
    }
}

// ==========================================
// MaterialPlan - 单材料下料方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPlan {
    pub material: Material,

    // ===== 层 / 板 =====
    pub layers: Vec<Layer>,
    pub layers_used: usize,
    pub layers_per_plate: u32,
    pub plates_used: i64,
    pub plates_left: i64, // 可为负: 需求超过库存

    // ===== 面积 (m²) =====
    pub ideal_area_m2: Decimal,       // 精确条带面积需求
    pub waste_width_area_m2: Decimal, // 层剩余宽度 × 切割长度
    pub m2_used: Decimal,             // 已用板面积
    pub m2_left: Decimal,             // 剩余板面积（plates_left < 0 时为 0）

    // ===== 报表用 =====
    pub strip_count: usize,
    pub thickness_waste_mm3: Decimal, // 厚度浪费, 不计入面积
}

impl MaterialPlan {
    /// 空方案（无订单项时）
    pub fn empty(material: Material, layers_per_plate: u32, stock_plates: i64, plate_area_m2: Decimal) -> Self {
        Self {
            material,
            layers: Vec::new(),
            layers_used: 0,
            layers_per_plate,
            plates_used: 0,
            plates_left: stock_plates,
            ideal_area_m2: Decimal::ZERO,
            waste_width_area_m2: Decimal::ZERO,
            m2_used: Decimal::ZERO,
            m2_left: plate_area_m2 * Decimal::from(stock_plates.max(0)),
            strip_count: 0,
            thickness_waste_mm3: Decimal::ZERO,
        }
    }

    /// 是否需求超过库存板数
    pub fn is_over_demand(&self) -> bool {
        self.plates_left < 0
    }
}

// ==========================================
// Issue - 不可排订单项诊断
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub material: Material,
    pub dimensions: Vec<u32>, // 尺寸不足三项时为实际解析到的数量
    pub quantity_unit: QuantityUnit,
    pub quantity: i64,
    pub code: IssueCode,
    pub detail: String,
}

// ==========================================
// PlanOutcome - 一次计算的完整输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub plans: Vec<MaterialPlan>, // 按 Material::ALL 顺序
    pub issues: Vec<Issue>,
}

impl PlanOutcome {
    pub fn plan_for(&self, material: Material) -> Option<&MaterialPlan> {
        self.plans.iter().find(|p| p.material == material)
    }

    /// 指定材料的理想面积（未四舍五入）
    pub fn ideal_area_for(&self, material: Material) -> Decimal {
        self.plan_for(material)
            .map(|p| p.ideal_area_m2)
            .unwrap_or(Decimal::ZERO)
    }
}
