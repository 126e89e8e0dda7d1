use super::{DeductOutcome, StockApi};
use crate::api::error::ApiError;
use crate::domain::ledger::{LedgerFilter, MonthOrRange};
use crate::domain::types::{LedgerOp, Material, YearMonth};
use crate::repository::ledger_repo::LedgerRepository;
use crate::repository::stock_store::StockStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup_api() -> (TempDir, StockApi) {
    let dir = TempDir::new().unwrap();
    let repo = LedgerRepository::open(StockStore::in_dir(dir.path())).unwrap();
    (dir, StockApi::new(Arc::new(repo)))
}

fn valge(amount: &str) -> Vec<(Material, Decimal)> {
    vec![(Material::PomValge, dec(amount)), (Material::PomMust, Decimal::ZERO)]
}

#[test]
fn test_deduct_lock_and_unlock_cycle() {
    let (_dir, api) = setup_api();
    let jan = MonthOrRange::Month(ym(2025, 1));

    api.manual_add(Material::PomValge, dec("5.00"), day(2025, 1, 2), "")
        .unwrap();
    api.manual_sub(Material::PomValge, dec("2.00"), day(2025, 1, 3), "")
        .unwrap();
    let outcome = api.try_deduct(&valge("1.00"), jan, "jan").unwrap();

    match &outcome {
        DeductOutcome::Posted(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].op, LedgerOp::MonthDeduct);
        }
        other => panic!("Expected Posted, got {:?}", other),
    }
    assert_eq!(api.balances().unwrap().get(Material::PomValge), dec("2.00"));
    assert!(api.is_month_locked(ym(2025, 1)).unwrap());

    // 再次扣减同月被拒绝, 台账不变
    match api.try_deduct(&valge("1.00"), jan, "again") {
        Err(ApiError::LockConflict { months }) => assert_eq!(months, vec![ym(2025, 1)]),
        other => panic!("Expected LockConflict, got {:?}", other),
    }
    assert_eq!(api.read(&LedgerFilter::default()).unwrap().len(), 3);

    // 解锁后恢复余额, 可再次扣减
    assert_eq!(api.unlock_month(ym(2025, 1)).unwrap(), 1);
    assert_eq!(api.balances().unwrap().get(Material::PomValge), dec("3.00"));
    assert!(!api.is_month_locked(ym(2025, 1)).unwrap());
    assert!(matches!(
        api.try_deduct(&valge("1.00"), jan, "retry").unwrap(),
        DeductOutcome::Posted(_)
    ));
}

#[test]
fn test_range_conflict_names_every_locked_month() {
    let (_dir, api) = setup_api();
    api.try_deduct(&valge("1"), MonthOrRange::Month(ym(2025, 2)), "")
        .unwrap();
    api.try_deduct(&valge("1"), MonthOrRange::Month(ym(2025, 4)), "")
        .unwrap();

    let range = MonthOrRange::Range {
        from: ym(2025, 1),
        to: ym(2025, 5),
    };
    match api.try_deduct(&valge("3"), range, "") {
        Err(ApiError::LockConflict { months }) => {
            assert_eq!(months, vec![ym(2025, 2), ym(2025, 4)])
        }
        other => panic!("Expected LockConflict, got {:?}", other),
    }
}

#[test]
fn test_range_deduction_posts_one_entry_per_material() {
    let (_dir, api) = setup_api();
    let range = MonthOrRange::Range {
        from: ym(2024, 12),
        to: ym(2025, 2),
    };

    let outcome = api
        .try_deduct(
            &[(Material::PomValge, dec("1.234")), (Material::PomMust, dec("0.5"))],
            range,
            "q1",
        )
        .unwrap();

    let DeductOutcome::Posted(entries) = outcome else {
        panic!("Expected Posted");
    };
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.op == LedgerOp::PeriodDeduct));
    assert_eq!(entries[0].amount_m2, dec("1.23"));
    assert_eq!(entries[0].effective_date, day(2024, 12, 1));
    let locked: Vec<YearMonth> = api.locked_months().unwrap().into_iter().collect();
    assert_eq!(locked, vec![ym(2024, 12), ym(2025, 1), ym(2025, 2)]);

    // 区间内任一月份解锁 → 整条区间扣减删除
    assert_eq!(api.unlock_month(ym(2025, 1)).unwrap(), 2);
    assert!(api.locked_months().unwrap().is_empty());
}

#[test]
fn test_all_zero_amounts_nothing_to_deduct() {
    let (_dir, api) = setup_api();

    let outcome = api
        .try_deduct(&valge("0.004"), MonthOrRange::Month(ym(2025, 6)), "")
        .unwrap();

    assert_eq!(outcome, DeductOutcome::NothingToDeduct);
    assert!(!api.is_month_locked(ym(2025, 6)).unwrap());
}

#[test]
fn test_inverted_range_rejected() {
    let (_dir, api) = setup_api();
    let range = MonthOrRange::Range {
        from: ym(2025, 3),
        to: ym(2025, 1),
    };

    let result = api.try_deduct(&valge("1"), range, "");

    assert!(matches!(result, Err(ApiError::InvalidInput(_))));
}

#[test]
fn test_manual_amount_must_be_positive() {
    let (_dir, api) = setup_api();

    assert!(matches!(
        api.manual_add(Material::PomMust, Decimal::ZERO, day(2025, 1, 1), ""),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.manual_sub(Material::PomMust, dec("-1"), day(2025, 1, 1), ""),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(api.read(&LedgerFilter::default()).unwrap().is_empty());
}

#[test]
fn test_set_balance_overrides_history() {
    let (_dir, api) = setup_api();
    api.manual_add(Material::PomMust, dec("7"), day(2025, 1, 1), "")
        .unwrap();

    api.set_balance(Material::PomMust, dec("2.5"), day(2025, 1, 2), "inventuur")
        .unwrap();
    api.manual_add(Material::PomMust, dec("1"), day(2025, 1, 3), "")
        .unwrap();

    assert_eq!(api.balances().unwrap().get(Material::PomMust), dec("3.5"));
}

#[test]
fn test_undo_appends_inverse_entry() {
    let (_dir, api) = setup_api();
    let added = api
        .manual_add(Material::PomValge, dec("4"), day(2025, 2, 10), "")
        .unwrap();

    let inverse = api.undo_entry(&added.entry_id).unwrap();

    assert_eq!(inverse.op, LedgerOp::Sub);
    assert_eq!(inverse.amount_m2, dec("4"));
    assert_eq!(inverse.effective_date, day(2025, 2, 10));
    assert_eq!(api.balances().unwrap().get(Material::PomValge), Decimal::ZERO);
    assert_eq!(api.read(&LedgerFilter::default()).unwrap().len(), 2);
}

#[test]
fn test_undo_rejects_deductions_and_unknown_ids() {
    let (_dir, api) = setup_api();
    let DeductOutcome::Posted(entries) = api
        .try_deduct(&valge("1"), MonthOrRange::Month(ym(2025, 1)), "")
        .unwrap()
    else {
        panic!("Expected Posted");
    };

    assert!(matches!(
        api.undo_entry(&entries[0].entry_id),
        Err(ApiError::BusinessRuleViolation(_))
    ));
    assert!(matches!(api.undo_entry("missing"), Err(ApiError::NotFound(_))));
}
