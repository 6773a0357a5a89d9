//! CSV files written at the end of a run.

use std::fs;

use synoptic_cli::output::{OutputPaths, write_outputs};
use synoptic_core::{Pipeline, PipelineOptions, Resources, run_batch};
use synoptic_model::{CodeBook, Column, Encoding, ReportType, Schema};
use tempfile::TempDir;

fn pipeline() -> Pipeline {
    let schema = Schema::new(vec![
        Column::new("Invasive Carcinoma", vec!["Invasive carcinoma".into()]),
        Column::new("Tumour Size", vec!["Tumour size".into()]),
    ])
    .unwrap();
    let mut book = CodeBook::new();
    book.push(
        "Invasive Carcinoma",
        Encoding::new(vec!["present".into()], 1),
    );
    book.push(
        "Invasive Carcinoma",
        Encoding::new(vec!["not identified".into()], 0),
    );
    Pipeline::new(
        Resources::new(schema, book),
        PipelineOptions::new(ReportType::Numeric),
    )
    .unwrap()
}

#[test]
fn raw_and_coded_rows_follow_schema_order() {
    let pipeline = pipeline();
    let output = run_batch(
        &pipeline,
        [
            (
                "4",
                "Synoptic Report\nTumour size: 14 mm\nInvasive carcinoma: Present\nComments: none",
            ),
            ("5", "Discharge summary only."),
        ],
    );

    let dir = TempDir::new().unwrap();
    let paths = OutputPaths::new(dir.path(), "20260101_000000");
    let columns: Vec<&str> = pipeline.encoder().schema().canonical_names().collect();
    write_outputs(&paths, &columns, &output.reports, &output.audit).unwrap();

    let raw = fs::read_to_string(&paths.raw).unwrap();
    assert_eq!(
        raw,
        "report_id,Invasive Carcinoma,Tumour Size\n4,Present,14 mm\n5,,\n"
    );
    let coded = fs::read_to_string(&paths.coded).unwrap();
    assert_eq!(
        coded,
        "report_id,Invasive Carcinoma,Tumour Size\n4,1,14 mm\n5,,\n"
    );
    let audit = fs::read_to_string(&paths.audit).unwrap();
    assert!(audit.starts_with("study_id,raw_label,canonical,distance,sample_value\n"));
}
