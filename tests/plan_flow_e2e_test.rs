// ==========================================
// 下料方案端到端测试
// ==========================================
// 测试目标: 订单 CSV → 规范化 → 下料方案 → 报表 → 月度扣减
// ==========================================

mod helpers;

use helpers::{create_test_state, dec, write_order_csv, ym};
use kumex_stock::api::read_order_lines;
use kumex_stock::{DeductOutcome, IssueCode, LedgerOp, Material, MonthOrRange, QuantityUnit};
use rust_decimal::Decimal;
use std::fs;

fn sample_rows() -> Vec<(&'static str, i64, &'static str)> {
    vec![
        ("POM Valge 22x52x1000", 70, ""),
        ("POM Must 30x40x1000", 2500, "2500 mm"),
        ("POM Must õhuke 20x20", 3, ""),
        ("PET 10x10x10", 4, ""),
        ("POM Valge 10x60x70", 0, ""),
    ]
}

#[test]
fn test_read_order_lines_from_csv() {
    let (dir, _state) = create_test_state();
    let path = write_order_csv(&dir, "orders.csv", &sample_rows());

    let lines = read_order_lines(&path).unwrap();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0].description, "POM Valge 22x52x1000");
    assert_eq!(lines[1].quantity_context, "2500 mm");
    assert_eq!(lines[0].po_number, None);
}

#[test]
fn test_read_order_lines_rejects_bad_quantity() {
    let (dir, _state) = create_test_state();
    let path = dir.path().join("bad.csv");
    fs::write(&path, "description,quantity\nPOM Valge 1x2x3,many\n").unwrap();

    assert!(read_order_lines(&path).is_err());
}

#[test]
fn test_plan_run_produces_plans_issues_and_reports() {
    let (dir, state) = create_test_state();
    let path = write_order_csv(&dir, "orders.csv", &sample_rows());
    let lines = read_order_lines(&path).unwrap();

    let run = state.plan_api.run(&lines, Some(Decimal::ONE), true).unwrap();

    // PET 行不计入
    assert_eq!(run.skipped_lines, 1);

    let valge = run.outcome.plan_for(Material::PomValge).unwrap();
    assert_eq!(valge.ideal_area_m2, dec("1.61"));
    assert_eq!(valge.layers.len(), 2);
    assert_eq!(valge.layers[0].strip_widths.len(), 43);
    assert_eq!(valge.layers[1].strip_widths.len(), 27);

    let must = run.outcome.plan_for(Material::PomMust).unwrap();
    assert!(must.ideal_area_m2 > Decimal::ZERO);

    // 扫描问题在前, 方案问题在后
    let codes: Vec<IssueCode> = run.outcome.issues.iter().map(|i| i.code).collect();
    assert_eq!(codes, vec![IssueCode::NoDimLeBaseThickness, IssueCode::QtyNonPositive]);
    assert_eq!(run.outcome.issues[1].quantity_unit, QuantityUnit::Pieces);

    let reports = run.reports.expect("reports written");
    for path in reports.all() {
        assert!(path.exists(), "missing report {}", path.display());
    }
    let layers_csv = fs::read_to_string(&reports.layers_csv).unwrap();
    assert!(layers_csv.starts_with("material,layer_id,remaining_width_mm,strip_widths"));
    assert!(layers_csv.contains("POM Valge,1,11,23 23"));
    let issues_csv = fs::read_to_string(&reports.issues_csv).unwrap();
    assert!(issues_csv.contains("QTY_NON_POSITIVE"));
    assert!(issues_csv.contains("NO_DIM_LE_BASE_THICKNESS"));
}

#[test]
fn test_repeated_runs_never_overwrite_reports() {
    let (dir, state) = create_test_state();
    let path = write_order_csv(&dir, "orders.csv", &sample_rows());
    let lines = read_order_lines(&path).unwrap();

    let first = state.plan_api.run(&lines, Some(Decimal::ONE), true).unwrap();
    let second = state.plan_api.run(&lines, Some(Decimal::ONE), true).unwrap();

    let first = first.reports.unwrap();
    let second = second.reports.unwrap();
    assert_ne!(first.summary_csv, second.summary_csv);
    assert!(first.summary_csv.exists());
    assert!(second.summary_csv.exists());
}

#[test]
fn test_plan_then_deduct_month() {
    let (dir, state) = create_test_state();
    let path = write_order_csv(&dir, "orders.csv", &sample_rows());
    let lines = read_order_lines(&path).unwrap();
    let run = state.plan_api.run(&lines, Some(Decimal::ONE), false).unwrap();
    let march = MonthOrRange::Month(ym(2025, 3));

    let outcome = state.stock_api.deduct_plan(&run.outcome, march, None).unwrap();

    let entries = match outcome {
        DeductOutcome::Posted(entries) => entries,
        other => panic!("Expected Posted, got {:?}", other),
    };
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.op == LedgerOp::MonthDeduct));
    assert!(entries.iter().all(|e| !e.note.is_empty()));
    assert_eq!(
        state.stock_api.balances().unwrap().rounded(Material::PomValge),
        dec("-1.61")
    );

    // 同一方案再次扣减被拒绝
    assert!(state.stock_api.deduct_plan(&run.outcome, march, Some("again")).is_err());
}

#[test]
fn test_empty_order_nothing_to_deduct() {
    let (_dir, state) = create_test_state();
    let run = state.plan_api.run(&[], None, false).unwrap();

    let outcome = state
        .stock_api
        .deduct_plan(&run.outcome, MonthOrRange::Month(ym(2025, 6)), None)
        .unwrap();

    assert_eq!(outcome, DeductOutcome::NothingToDeduct);
    assert!(!state.stock_api.is_month_locked(ym(2025, 6)).unwrap());
}
