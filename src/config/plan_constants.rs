// ==========================================
// Kumex 切割车间 - 下料固定常量
// ==========================================
// 板材: 1000 × 2000 mm, 基准厚度 52 mm, 库存 10 块
// 切割长度固定 1000 mm
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 默认板宽 (mm)
pub const PLATE_WIDTH_MM: u32 = 1000;
/// 默认板长 (mm)
pub const PLATE_LENGTH_MM: u32 = 2000;
/// 默认基准厚度 (mm)
pub const BASE_THICKNESS_MM: u32 = 52;
/// 默认库存板数
pub const STOCK_PLATES: i64 = 10;
/// 默认切割长度 (mm)
pub const DEFAULT_CUT_LEN_MM: u32 = 1000;
/// 数量单位推断阈值: 数量 >= 该值视为长度 (mm)
pub const LENGTH_UNIT_THRESHOLD: i64 = 1000;
/// 单个订单项条带数上限（超过按 QTY_TOO_LARGE 上报）
pub const MAX_STRIPS_PER_ITEM: u64 = 100_000;
/// 条带数上限的可配置最大值
const MAX_STRIPS_CEILING: u64 = 10_000_000;

const MM2_PER_M2: i64 = 1_000_000;

// ==========================================
// PlanConstants - 下料常量
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConstants {
    pub plate_width_mm: u32,
    pub plate_length_mm: u32,
    pub base_thickness_mm: u32,
    pub stock_plates: i64,
    pub cut_len_mm: u32,
    pub length_unit_threshold: i64,
    #[serde(default = "default_max_strips_per_item")]
    pub max_strips_per_item: u64,
}

fn default_max_strips_per_item() -> u64 {
    MAX_STRIPS_PER_ITEM
}

impl Default for PlanConstants {
    fn default() -> Self {
        Self {
            plate_width_mm: PLATE_WIDTH_MM,
            plate_length_mm: PLATE_LENGTH_MM,
            base_thickness_mm: BASE_THICKNESS_MM,
            stock_plates: STOCK_PLATES,
            cut_len_mm: DEFAULT_CUT_LEN_MM,
            length_unit_threshold: LENGTH_UNIT_THRESHOLD,
            max_strips_per_item: MAX_STRIPS_PER_ITEM,
        }
    }
}

impl PlanConstants {
    /// 校验常量
    ///
    /// # 返回
    /// - Ok(()): 常量可用
    /// - Err(ConfigError::InvalidConstant): 切割长度/板宽/板长/基准厚度非正,
    ///   或板长不足一个切割长度（每块板 0 层）
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cut_len_mm == 0 {
            return Err(ConfigError::invalid("cut_len_mm", "切割长度必须大于 0"));
        }
        if self.plate_width_mm == 0 {
            return Err(ConfigError::invalid("plate_width_mm", "板宽必须大于 0"));
        }
        if self.plate_length_mm == 0 {
            return Err(ConfigError::invalid("plate_length_mm", "板长必须大于 0"));
        }
        if self.base_thickness_mm == 0 {
            return Err(ConfigError::invalid("base_thickness_mm", "基准厚度必须大于 0"));
        }
        if self.layers_per_plate() == 0 {
            return Err(ConfigError::invalid(
                "plate_length_mm",
                format!(
                    "板长 {} 小于切割长度 {}, 每块板无法容纳一层",
                    self.plate_length_mm, self.cut_len_mm
                ),
            ));
        }
        if self.length_unit_threshold <= 0 {
            return Err(ConfigError::invalid("length_unit_threshold", "单位推断阈值必须大于 0"));
        }
        if self.max_strips_per_item == 0 || self.max_strips_per_item > MAX_STRIPS_CEILING {
            return Err(ConfigError::invalid(
                "max_strips_per_item",
                format!("单项条带数上限必须在 1..={} 之间", MAX_STRIPS_CEILING),
            ));
        }
        Ok(())
    }

    /// 每块板层数 = floor(板长 / 切割长度)
    pub fn layers_per_plate(&self) -> u32 {
        if self.cut_len_mm == 0 {
            return 0;
        }
        self.plate_length_mm / self.cut_len_mm
    }

    /// 单块板面积 (m²)
    pub fn plate_area_m2(&self) -> Decimal {
        mm2_to_m2(Decimal::from(self.plate_width_mm) * Decimal::from(self.plate_length_mm))
    }

    pub fn plate_width(&self) -> Decimal {
        Decimal::from(self.plate_width_mm)
    }

    pub fn cut_len(&self) -> Decimal {
        Decimal::from(self.cut_len_mm)
    }
}

/// mm² → m²（精确十进制）
pub fn mm2_to_m2(mm2: Decimal) -> Decimal {
    mm2 / Decimal::from(MM2_PER_M2)
}
