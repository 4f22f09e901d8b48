//! Integration tests for core summary types.

use pocketbook_core::{CategoryTotal, MONTHS_PER_YEAR, MonthlySeries, MonthlyTotal};

#[test]
fn test_series_from_api_payload() {
    let totals: Vec<MonthlyTotal> = serde_json::from_str(
        r#"[{"month": 12, "total": 20}, {"month": 3, "total": 150}]"#,
    )
    .unwrap();

    let series: Vec<f64> = MonthlySeries::from_totals(&totals).into();
    assert_eq!(
        series,
        vec![0.0, 0.0, 150.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 20.0]
    );
}

#[test]
fn test_series_length_invariant() {
    for month in -2..20 {
        let series = MonthlySeries::from_totals(&[MonthlyTotal::new(month, 1.0)]);
        assert_eq!(series.as_slice().len(), MONTHS_PER_YEAR);
        if (1..=12).contains(&month) {
            assert_eq!(series.as_slice()[usize::try_from(month - 1).unwrap()], 1.0);
        } else {
            assert_eq!(series.total(), 0.0);
        }
    }
}

#[test]
fn test_series_serializes_as_plain_array() {
    let series = MonthlySeries::from_totals(&[MonthlyTotal::new(1, 5.0)]);
    let json = serde_json::to_value(series).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(MONTHS_PER_YEAR));
}

#[test]
fn test_category_breakdown_payload() {
    let categories: Vec<CategoryTotal> =
        serde_json::from_str(r#"[{"category": "Rent", "amount": 900}, {"category": "Food"}]"#)
            .unwrap();
    assert_eq!(categories[0].amount, 900.0);
    assert_eq!(categories[1].amount, 0.0);
}
