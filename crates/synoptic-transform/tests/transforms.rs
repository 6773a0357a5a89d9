//! Cleaning regimes and registry transforms applied the way the pipeline
//! applies them.

use std::collections::BTreeMap;

use synoptic_model::{CategoryTable, ReportType, Value};
use synoptic_transform::{
    TransformContext, TransformError, TransformInput, TransformRegistry, ValueCleaner,
    default_registry,
};

fn context() -> TransformContext {
    TransformContext {
        categories: CategoryTable {
            t: vec!["T1a".into(), "T1mi".into(), "T2".into(), "T3".into()],
            n: vec!["N0".into(), "N1mi".into(), "N1a".into()],
            m: vec!["M0".into(), "M1".into()],
        },
        ..TransformContext::default()
    }
}

#[test]
fn stage_column_is_repaired_during_cleaning() {
    let registry = default_registry();
    let mut cleaner = ValueCleaner::new(ReportType::Numeric);
    cleaner
        .assign(registry, "Pathologic Stage", "tnm_stage")
        .unwrap();

    let extractions = BTreeMap::from([
        ("Pathologic Stage".to_string(), Value::new("mpTla pNlmi")),
        (
            "Invasive Carcinoma".to_string(),
            Value::new("Invasive Carcinoma: Present"),
        ),
    ]);
    let cleaned = cleaner.clean_all(&extractions, registry, &context());

    assert!(cleaned.failures.is_empty());
    assert_eq!(cleaned.values["Pathologic Stage"].primary, "T1a N1mi");
    assert_eq!(cleaned.values["Invasive Carcinoma"].primary, "Present");
}

#[test]
fn failed_transform_keeps_default_cleaning() {
    let registry = default_registry();
    let mut cleaner = ValueCleaner::new(ReportType::Alpha);
    cleaner.assign(registry, "Tumour Site", "clock-position").unwrap();

    let extractions = BTreeMap::from([(
        "Tumour Site".to_string(),
        Value::new("Upper outer quadrant"),
    )]);
    let cleaned = cleaner.clean_all(&extractions, registry, &context());

    assert_eq!(cleaned.values["Tumour Site"].primary, "upper outer quadrant");
    assert_eq!(cleaned.failures.len(), 1);
    assert_eq!(cleaned.failures[0].0, "Tumour Site");
}

#[test]
fn clock_positions_follow_the_report_type() {
    let registry = default_registry();
    let extractions = BTreeMap::from([("Clock".to_string(), Value::new("10:00"))]);

    let mut operative = ValueCleaner::new(ReportType::Alpha);
    operative.assign(registry, "Clock", "clock_position").unwrap();
    let cleaned = operative.clean_all(&extractions, registry, &context());
    assert_eq!(cleaned.values["Clock"].primary, "10 o'clock");

    let mut pathology = ValueCleaner::new(ReportType::Numeric);
    pathology.assign(registry, "Clock", "clock_position").unwrap();
    let extractions = BTreeMap::from([("Clock".to_string(), Value::new("10 o'clock"))]);
    let cleaned = pathology.clean_all(&extractions, registry, &context());
    assert_eq!(cleaned.values["Clock"].primary, "10:00");
}

#[test]
fn computed_transforms_cannot_clean() {
    let registry = default_registry();
    let mut cleaner = ValueCleaner::new(ReportType::Numeric);
    let err = cleaner
        .assign(registry, "Nottingham Score", "nottingham_score")
        .unwrap_err();
    assert!(matches!(err, TransformError::NotCleaning { .. }));

    let err = cleaner.assign(registry, "Tumour Size", "inches").unwrap_err();
    assert_eq!(err, TransformError::UnknownTransform("inches".to_string()));
}

#[test]
fn nottingham_composition_from_encoded_subscores() {
    let registry = default_registry();
    let context = context();
    let columns = &context.nottingham;
    let encoded = BTreeMap::from([
        (columns.tubule.clone(), "2".to_string()),
        (columns.nuclear.clone(), "3".to_string()),
        (columns.mitotic.clone(), "2".to_string()),
    ]);
    let raw = Value::empty();
    let mut input = TransformInput {
        column: "Nottingham Score",
        value: &raw,
        encoded: &encoded,
        report_type: ReportType::Numeric,
        context: &context,
    };
    let score = registry.apply("nottingham_score", &input).unwrap();
    assert_eq!(score, "7");

    let mut with_score = encoded.clone();
    with_score.insert(columns.score.clone(), score);
    input.encoded = &with_score;
    input.column = "Histologic Grade";
    assert_eq!(registry.apply("histologic_grade", &input).unwrap(), "2");
}

#[test]
fn empty_registry_rejects_every_name() {
    let registry = TransformRegistry::new();
    assert!(registry.is_empty());
    let value = Value::new("x");
    let context = context();
    let encoded = BTreeMap::new();
    let input = TransformInput {
        column: "Any",
        value: &value,
        encoded: &encoded,
        report_type: ReportType::Alpha,
        context: &context,
    };
    assert!(matches!(
        registry.apply("mm", &input),
        Err(TransformError::UnknownTransform(_))
    ));
}
