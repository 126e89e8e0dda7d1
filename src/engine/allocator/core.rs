use super::packing::pack_first_fit;
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::plan_constants::{mm2_to_m2, PlanConstants};
use crate::domain::order::OrderItem;
use crate::domain::plan::{Issue, MaterialPlan, PlanOutcome};
use crate::domain::types::{IssueCode, Material, QuantityUnit};
use crate::i18n;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::instrument;

// ==========================================
// StripDemand - 单订单项的条带需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripDemand {
    pub width_mm: Decimal,         // 选定条带宽度（含锯缝）
    pub strips: u64,               // 条带数
    pub ideal_area_m2: Decimal,    // strips × width × cut_len
    pub thickness_mm: u32,         // 选定厚度 t
    pub thickness_waste_mm3: Decimal,
}

/// 候选摆放方向（排序键: 宽度需求 → 长度浪费 → 厚度浪费）
#[derive(Debug, Clone)]
struct Orientation {
    width_demand: Decimal,
    length_waste: Decimal,
    thickness_waste: Decimal,
    width_mm: Decimal,
    strips: u64,
    ideal_area_m2: Decimal,
}

// ==========================================
// CuttingPlanAllocator - 下料方案分配引擎
// ==========================================
pub struct CuttingPlanAllocator {
    constants: PlanConstants,
}

impl CuttingPlanAllocator {
    /// 构造函数
    ///
    /// # 返回
    /// - Err(ConfigError): 固定常量无效（配置缺陷, 非运行时问题）
    pub fn new(constants: PlanConstants) -> ConfigResult<Self> {
        constants.validate()?;
        Ok(Self { constants })
    }

    pub fn constants(&self) -> &PlanConstants {
        &self.constants
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 全部跟踪材料的方案（按 Material::ALL 顺序）
    ///
    /// 订单项按材料分组, 组内保持原始顺序
    pub fn plan_all(&self, items: &[OrderItem], kerf_mm: Decimal) -> ConfigResult<PlanOutcome> {
        let mut plans = Vec::with_capacity(Material::ALL.len());
        let mut issues = Vec::new();

        for material in Material::ALL {
            let material_items: Vec<OrderItem> = items
                .iter()
                .filter(|item| item.material == material)
                .cloned()
                .collect();
            let (plan, mut material_issues) = self.plan(material, &material_items, kerf_mm)?;
            plans.push(plan);
            issues.append(&mut material_issues);
        }

        Ok(PlanOutcome { plans, issues })
    }

    /// 单材料方案
    ///
    /// 规则：
    /// 1) 每个订单项独立计算条带需求, 失败项记 Issue 并排除
    /// 2) 全部条带按宽度降序 first-fit 装层
    /// 3) 层按 layers_per_plate 汇总为板
    ///
    /// # 返回
    /// - Ok((MaterialPlan, Vec<Issue>))
    /// - Err(ConfigError): 锯缝宽度为负
    #[instrument(skip(self, items), fields(material = %material, items_count = items.len(), kerf_mm = %kerf_mm))]
    pub fn plan(
        &self,
        material: Material,
        items: &[OrderItem],
        kerf_mm: Decimal,
    ) -> ConfigResult<(MaterialPlan, Vec<Issue>)> {
        if kerf_mm.is_sign_negative() && !kerf_mm.is_zero() {
            return Err(ConfigError::invalid("kerf_mm", format!("锯缝宽度不能为负: {}", kerf_mm)));
        }

        let c = &self.constants;
        let mut issues = Vec::new();
        let mut strip_pool: Vec<Decimal> = Vec::new();
        let mut ideal_area_m2 = Decimal::ZERO;
        let mut thickness_waste_mm3 = Decimal::ZERO;

        // 1. 逐项计算条带需求
        for item in items {
            match self.strip_demand(item, kerf_mm) {
                Ok(demand) => {
                    tracing::debug!(
                        dims = ?item.dimensions,
                        quantity = item.quantity,
                        width_mm = %demand.width_mm,
                        strips = demand.strips,
                        "订单项已排入"
                    );
                    // strips 已受 max_strips_per_item 限制
                    let count = usize::try_from(demand.strips).unwrap_or(usize::MAX);
                    strip_pool.extend(std::iter::repeat(demand.width_mm).take(count));
                    ideal_area_m2 += demand.ideal_area_m2;
                    thickness_waste_mm3 += demand.thickness_waste_mm3;
                }
                Err(issue) => {
                    tracing::debug!(code = %issue.code, dims = ?issue.dimensions, "订单项不可排");
                    issues.push(issue);
                }
            }
        }

        // 2. 装层
        let plate_width = c.plate_width();
        let layers = pack_first_fit(&strip_pool, plate_width);
        let waste_width_mm: Decimal = layers.iter().map(|l| l.remaining_width_mm).sum();

        // 3. 汇总为板
        let layers_per_plate = c.layers_per_plate();
        let layers_used = layers.len();
        let plates_used = plates_for_layers(layers_used as u64, layers_per_plate) as i64;
        let plates_left = c.stock_plates - plates_used;
        let plate_area = c.plate_area_m2();

        let plan = MaterialPlan {
            material,
            layers_used,
            layers_per_plate,
            plates_used,
            plates_left,
            ideal_area_m2,
            waste_width_area_m2: mm2_to_m2(waste_width_mm * c.cut_len()),
            m2_used: plate_area * Decimal::from(plates_used),
            m2_left: plate_area * Decimal::from(plates_left.max(0)),
            strip_count: strip_pool.len(),
            thickness_waste_mm3,
            layers,
        };

        if plan.is_over_demand() {
            tracing::warn!(
                material = %material,
                plates_used,
                stock_plates = c.stock_plates,
                "板材需求超过库存"
            );
        }

        Ok((plan, issues))
    }

    /// 单订单项条带需求
    ///
    /// # 返回
    /// - Ok(StripDemand): 选定方向
    /// - Err(Issue): QTY_NON_POSITIVE / NO_DIM_LE_BASE_THICKNESS /
    ///   WIDTH_EXCEEDS_PLATE / NO_FEASIBLE_ORIENTATION / QTY_TOO_LARGE
    pub fn strip_demand(&self, item: &OrderItem, kerf_mm: Decimal) -> Result<StripDemand, Issue> {
        let c = &self.constants;

        // 1) 数量必须为正
        if item.quantity <= 0 {
            let code = IssueCode::QtyNonPositive;
            return Err(self.issue(item, code, i18n::t(code.message_key())));
        }

        // 尺寸为 0 的订单项无法成条（长度为 0 时每条件数无定义）
        if item.dimensions.contains(&0) {
            return Err(self.issue(
                item,
                IssueCode::NoFeasibleOrientation,
                i18n::t("issue.zero_dimension"),
            ));
        }

        // 2) 厚度 t = 不超过基准厚度的最大尺寸, 其余两项为底面 (p, q)
        let Some(t) = item
            .dimensions
            .iter()
            .copied()
            .filter(|d| *d <= c.base_thickness_mm)
            .max()
        else {
            return Err(self.issue(
                item,
                IssueCode::NoDimLeBaseThickness,
                i18n::t_with_args(
                    "issue.all_dims_exceed_base",
                    &[("base", &c.base_thickness_mm.to_string())],
                ),
            ));
        };

        let mut rest: Vec<u32> = item.dimensions.to_vec();
        if let Some(pos) = rest.iter().position(|d| *d == t) {
            rest.remove(pos);
        }
        rest.sort_unstable_by(|a, b| b.cmp(a));
        let (p, q) = (rest[0], rest[1]);

        // 3) 锯缝补偿: 等于切割长度的尺寸视为已定长, 不加锯缝
        let cut_len = c.cut_len();
        let add_kerf = |dim: u32| -> Decimal {
            let d = Decimal::from(dim);
            if d == cut_len {
                d
            } else {
                d + kerf_mm
            }
        };
        let p_eff = add_kerf(p);
        let q_eff = add_kerf(q);

        // 4) 两个方向
        let plate_width = c.plate_width();
        let thickness_waste = Decimal::from(c.base_thickness_mm - t);
        let quantity = Decimal::from(item.quantity);
        let mut width_rejected = 0;
        let mut orientations: Vec<Orientation> = Vec::with_capacity(2);

        for (w, l) in [(p_eff, q_eff), (q_eff, p_eff)] {
            if w > plate_width {
                width_rejected += 1;
                continue;
            }
            if l <= Decimal::ZERO || l > cut_len {
                continue;
            }

            match item.quantity_unit {
                QuantityUnit::Pieces => {
                    let k = (cut_len / l).floor();
                    if k <= Decimal::ZERO {
                        continue;
                    }
                    let strips = ceil_div(quantity, k);
                    let strips_dec = Decimal::from(strips);
                    orientations.push(Orientation {
                        width_demand: strips_dec * w,
                        length_waste: strips_dec * cut_len - quantity * l,
                        thickness_waste,
                        width_mm: w,
                        strips,
                        ideal_area_m2: mm2_to_m2(strips_dec * w * cut_len),
                    });
                }
                QuantityUnit::LengthMm => {
                    // 长度连续, 使用最窄的底面边作为条带宽度
                    let w_use = w.min(p_eff).min(q_eff);
                    let strips = ceil_div(quantity, cut_len);
                    let strips_dec = Decimal::from(strips);
                    orientations.push(Orientation {
                        width_demand: strips_dec * w_use,
                        length_waste: strips_dec * cut_len - quantity,
                        thickness_waste,
                        width_mm: w_use,
                        strips,
                        ideal_area_m2: mm2_to_m2(strips_dec * w_use * cut_len),
                    });
                }
            }
        }

        // 5) 选择: 宽度需求 → 长度浪费 → 厚度浪费（min_by 同值取先出现者）
        let Some(best) = orientations.into_iter().min_by(|a, b| {
            a.width_demand
                .cmp(&b.width_demand)
                .then(a.length_waste.cmp(&b.length_waste))
                .then(a.thickness_waste.cmp(&b.thickness_waste))
        }) else {
            return Err(if width_rejected == 2 {
                self.issue(
                    item,
                    IssueCode::WidthExceedsPlate,
                    i18n::t_with_args(
                        IssueCode::WidthExceedsPlate.message_key(),
                        &[("plate", &c.plate_width_mm.to_string())],
                    ),
                )
            } else {
                self.issue(
                    item,
                    IssueCode::NoFeasibleOrientation,
                    i18n::t(IssueCode::NoFeasibleOrientation.message_key()),
                )
            });
        };

        // 6) 条带数上限
        if best.strips > c.max_strips_per_item {
            let code = IssueCode::QtyTooLarge;
            return Err(self.issue(
                item,
                code,
                i18n::t_with_args(
                    code.message_key(),
                    &[
                        ("strips", &best.strips.to_string()),
                        ("limit", &c.max_strips_per_item.to_string()),
                    ],
                ),
            ));
        }

        // 7) 厚度浪费（仅报表）
        let thickness_waste_mm3 = if t < c.base_thickness_mm {
            thickness_waste * Decimal::from(p) * Decimal::from(q) * quantity
        } else {
            Decimal::ZERO
        };

        Ok(StripDemand {
            width_mm: best.width_mm,
            strips: best.strips,
            ideal_area_m2: best.ideal_area_m2,
            thickness_mm: t,
            thickness_waste_mm3,
        })
    }

    fn issue(&self, item: &OrderItem, code: IssueCode, detail: String) -> Issue {
        Issue {
            material: item.material,
            dimensions: item.dimensions.to_vec(),
            quantity_unit: item.quantity_unit,
            quantity: item.quantity,
            code,
            detail,
        }
    }
}

/// 板数 = ceil(层数 / 每板层数)
pub(crate) fn plates_for_layers(layers_used: u64, layers_per_plate: u32) -> u64 {
    if layers_per_plate == 0 {
        return 0;
    }
    layers_used.div_ceil(layers_per_plate as u64)
}

/// 正数向上取整除法（结果为条带数）
fn ceil_div(numerator: Decimal, denominator: Decimal) -> u64 {
    (numerator / denominator).ceil().to_u64().unwrap_or(0)
}
