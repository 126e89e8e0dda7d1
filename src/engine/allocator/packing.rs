use crate::domain::plan::Layer;
use rust_decimal::Decimal;

/// 条带装层（贪心 first-fit）
///
/// 规则：
/// 1) 条带宽度按降序稳定排序（同宽保持原始放入顺序）
/// 2) 依次放入第一个 "已用宽度 + 宽度 <= 板宽" 的层
/// 3) 都放不下则新开一层
///
/// # 返回
/// 层列表（id 从 1 开始, remaining_width_mm = 板宽 - 已用宽度）
pub fn pack_first_fit(strip_widths: &[Decimal], plate_width_mm: Decimal) -> Vec<Layer> {
    let mut sorted: Vec<Decimal> = strip_widths.to_vec();
    // sort_by 为稳定排序
    sorted.sort_by(|a, b| b.cmp(a));

    let mut layers: Vec<Vec<Decimal>> = Vec::new();
    let mut used: Vec<Decimal> = Vec::new();

    for width in sorted {
        let slot = used
            .iter()
            .position(|sum| *sum + width <= plate_width_mm);

        match slot {
            Some(idx) => {
                layers[idx].push(width);
                used[idx] += width;
            }
            None => {
                layers.push(vec![width]);
                used.push(width);
            }
        }
    }

    layers
        .into_iter()
        .zip(used)
        .enumerate()
        .map(|(idx, (strip_widths, sum))| Layer {
            id: idx + 1,
            strip_widths,
            remaining_width_mm: plate_width_mm - sum,
        })
        .collect()
}
