//! Tests for synoptic-model types.

use std::collections::BTreeMap;

use synoptic_model::{
    AuditLog, AuditRecord, Column, Laterality, Report, ReportType, Schema, Value,
    codes_equivalent,
};

#[test]
fn zero_empty_columns_treat_blank_as_zero() {
    let column = Column::new("Number of Foci", vec!["Number of foci".into()]).with_zero_empty(true);
    assert!(codes_equivalent(&column, "", "0"));
    assert!(codes_equivalent(&column, "0", " "));
    assert!(!codes_equivalent(&column, "1", ""));

    let strict = Column::new("Margins", vec!["Margins".into()]);
    assert!(!codes_equivalent(&strict, "", "0"));
}

#[test]
fn report_type_parses_aliases() {
    assert_eq!("operative".parse::<ReportType>().unwrap(), ReportType::Alpha);
    assert_eq!("NUMERIC".parse::<ReportType>().unwrap(), ReportType::Numeric);
    assert!("radiology".parse::<ReportType>().is_err());
}

#[test]
fn laterality_from_mentions() {
    assert_eq!(Laterality::from_mentions(true, true), Laterality::Bilateral);
    assert_eq!(Laterality::from_mentions(false, true), Laterality::Right);
    assert_eq!(Laterality::from_mentions(false, false), Laterality::Unknown);
}

#[test]
fn audit_logs_concatenate_in_order() {
    let record = |label: &str| AuditRecord {
        study_id: "1".into(),
        raw_label: label.into(),
        canonical: "Margins".into(),
        distance: 1,
        sample_value: "clear".into(),
    };
    let mut first = AuditLog::new();
    first.push(record("margin"));
    let mut second = AuditLog::new();
    second.push(record("margns"));
    first.extend(second);
    let labels: Vec<_> = first.records().iter().map(|r| r.raw_label.as_str()).collect();
    assert_eq!(labels, vec!["margin", "margns"]);
}

#[test]
fn report_serializes() {
    let mut report = Report::new("3", ReportType::Numeric, "Grade: 2");
    report.isolate("Grade: 2".into(), Laterality::Left).unwrap();
    let mut extractions = BTreeMap::new();
    extractions.insert("Grade".to_string(), Value::new("2"));
    report.set_extracted(extractions).unwrap();
    let json = serde_json::to_string(&report).expect("serialize report");
    let round: Report = serde_json::from_str(&json).expect("deserialize report");
    assert_eq!(round.id(), "3");
    assert_eq!(round.extractions()["Grade"].primary, "2");
}

#[test]
fn schema_lookup_by_cleaned_name() {
    let schema = Schema::new(vec![Column::new(
        "Lymphovascular Invasion",
        vec!["Lymphovascular invasion".into()],
    )])
    .unwrap();
    assert!(schema.find_cleaned("lymphovascular  INVASION:").is_some());
}
