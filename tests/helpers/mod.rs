// ==========================================
// 集成测试辅助函数
// ==========================================
// 职责: 临时状态目录、订单 CSV、常用构造
// ==========================================

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use kumex_stock::config::plan_constants::PlanConstants;
use kumex_stock::{AppState, Material, YearMonth};
use rust_decimal::Decimal;
use tempfile::TempDir;

/// 订单 CSV 表头
pub const ORDER_CSV_HEADER: &str = "description,quantity,quantity_context,po_number,order_date";

/// 在临时目录中创建 AppState
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活）
/// - AppState
pub fn create_test_state() -> (TempDir, AppState) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let state = open_state(&dir);
    (dir, state)
}

/// 在已有目录上重新打开 AppState（模拟进程重启）
pub fn open_state(dir: &TempDir) -> AppState {
    AppState::new(dir.path(), PlanConstants::default()).expect("Failed to create AppState")
}

/// 库存文档路径
pub fn stock_file(dir: &TempDir) -> PathBuf {
    dir.path().join(kumex_stock::repository::stock_store::STOCK_FILE_NAME)
}

/// 写出订单 CSV
///
/// 每行: (description, quantity, quantity_context)
pub fn write_order_csv(dir: &TempDir, name: &str, rows: &[(&str, i64, &str)]) -> PathBuf {
    let path = dir.path().join(name);
    let mut content = String::from(ORDER_CSV_HEADER);
    content.push('\n');
    for (description, quantity, context) in rows {
        content.push_str(&format!("\"{}\",{},\"{}\",,\n", description, quantity, context));
    }
    fs::write(&path, content).expect("Failed to write order csv");
    path
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("Invalid decimal")
}

pub fn ym(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).expect("Invalid month")
}

pub fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).expect("Invalid date")
}

/// 只扣 POM Valge
pub fn valge_only(amount: &str) -> Vec<(Material, Decimal)> {
    vec![(Material::PomValge, dec(amount)), (Material::PomMust, Decimal::ZERO)]
}
