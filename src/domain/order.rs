// ==========================================
// Kumex 切割车间 - 订单行领域模型
// ==========================================
// 职责: 文本抽取协作方交付的原始订单行 + 规范化后的订单项
// 生命周期: 每次扫描生成, 不落库
// ==========================================

use crate::domain::plan::Issue;
use crate::domain::types::{Material, QuantityUnit};
use serde::{Deserialize, Serialize};

// ==========================================
// RawOrderLine - 原始订单行
// ==========================================
// 来源: 外部文本抽取（描述 / 数量 / PO / 日期 token）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOrderLine {
    pub description: String,      // 材料/尺寸描述
    pub quantity: i64,            // 数量 token
    #[serde(default)]
    pub quantity_context: String, // 数量所在的上下文行（用于识别 mm 单位标记）
    #[serde(default)]
    pub po_number: Option<String>, // PO 号
    #[serde(default)]
    pub order_date: Option<String>, // 订单日期（原文）
}

impl RawOrderLine {
    pub fn new(description: &str, quantity: i64) -> Self {
        Self {
            description: description.to_string(),
            quantity,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.quantity_context = context.to_string();
        self
    }
}

// ==========================================
// OrderItem - 订单项
// ==========================================
// 三个尺寸作为无序集合使用（存储为降序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub material: Material,
    pub dimensions: [u32; 3],
    pub quantity: i64,
    pub quantity_unit: QuantityUnit,
    #[serde(default)]
    pub source_description: String,
}

impl OrderItem {
    pub fn new(material: Material, dimensions: [u32; 3], quantity: i64, unit: QuantityUnit) -> Self {
        Self {
            material,
            dimensions,
            quantity,
            quantity_unit: unit,
            source_description: String::new(),
        }
    }
}

// ==========================================
// ScanResult - 扫描结果
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub items: Vec<OrderItem>,
    pub issues: Vec<Issue>,
    /// 未跟踪材料被跳过的行数
    pub skipped_lines: usize,
}

impl ScanResult {
    /// 指定材料的订单项（保持原始顺序）
    pub fn items_for(&self, material: Material) -> Vec<OrderItem> {
        self.items
            .iter()
            .filter(|item| item.material == material)
            .cloned()
            .collect()
    }
}
