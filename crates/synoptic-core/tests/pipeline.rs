//! Whole reports through every stage.

use std::fs;
use std::path::{Path, PathBuf};

use synoptic_core::{InputPaths, Pipeline, PipelineOptions, Resources, run_batch};
use synoptic_model::{
    CategoryTable, CodeBook, Column, Encoding, Laterality, MALFUNCTION_CODE, ReportType,
    SPECIAL_CODE, Schema,
};
use tempfile::TempDir;

const NOTTINGHAM_PARTS: [&str; 3] = [
    "Glandular (Acinar)/Tubular Differentiation",
    "Nuclear Pleomorphism",
    "Mitotic Rate",
];

const PATHOLOGY: &str = "\
Surgical Pathology Report
Clinical history: screen detected mass
Invasive Carcinoma Synoptic Report
Invasive Carcinoma: Present
Histologic Type: Invasive ductal carcinoma
Glandular (Acinar)/Tubular Differentiation: 2
Nuclear Pleomorphism: 3
Mitotic Rate: 2
Pathologic Stage: mpTla pNlmi
Comments: reviewed at consensus conference
";

const BILATERAL_OPERATIVE: &str = "\
Patient: 12
Preoperative diagnosis: carcinoma of the left and right breast
Synoptic Operative Report
Surgeon: staff
Left breast:
Procedure: lumpectomy
Axillary procedure: sentinel node biopsy
Right breast:
Procedure: mastectomy
Axillary procedure: none
Electronically signed by staff
";

fn column(name: &str) -> Column {
    Column::new(name, vec![name.to_string()])
}

fn pathology_schema() -> Schema {
    let mut columns = vec![
        column("Invasive Carcinoma"),
        column("Histologic Type"),
        column("Pathologic Stage"),
    ];
    columns.extend(NOTTINGHAM_PARTS.map(column));
    columns.push(column("Nottingham Score"));
    columns.push(column("Histologic Grade"));
    Schema::new(columns).unwrap()
}

fn pathology_code_book() -> CodeBook {
    let mut book = CodeBook::new();
    book.push(
        "Invasive Carcinoma",
        Encoding::new(vec!["present".into(), "identified".into()], 1),
    );
    book.push(
        "Invasive Carcinoma",
        Encoding::new(vec!["not identified".into(), "absent".into()], 0),
    );
    book.push(
        "Histologic Type",
        Encoding::new(vec!["invasive ductal carcinoma".into()], 1),
    );
    book.push(
        "Histologic Type",
        Encoding::new(vec!["invasive lobular carcinoma".into()], 2),
    );
    for part in NOTTINGHAM_PARTS {
        for score in 1..=3 {
            book.push(
                part,
                Encoding::new(vec![score.to_string(), format!("score {score}")], score),
            );
        }
    }
    book.push(
        "Nottingham Score",
        Encoding::new(vec!["nottingham_score".into()], SPECIAL_CODE),
    );
    book.push(
        "Histologic Grade",
        Encoding::new(vec!["histologic_grade".into()], SPECIAL_CODE),
    );
    book
}

fn pathology_pipeline() -> Pipeline {
    let resources = Resources {
        categories: CategoryTable {
            t: vec!["T1a".into(), "T1b".into(), "T2".into()],
            n: vec!["N0".into(), "N1mi".into(), "N1a".into()],
            m: vec!["M0".into(), "M1".into()],
        },
        ..Resources::new(pathology_schema(), pathology_code_book())
    };
    let options = PipelineOptions::new(ReportType::Numeric)
        .with_column_transform("Pathologic Stage", "tnm_stage");
    Pipeline::new(resources, options).unwrap()
}

#[test]
fn pathology_report_is_encoded_end_to_end() {
    let pipeline = pathology_pipeline();
    let outcome = pipeline.process_text("7", PATHOLOGY).unwrap();

    assert!(!outcome.no_synoptic);
    assert_eq!(outcome.reports.len(), 1);
    let report = &outcome.reports[0];
    assert!(report.is_encoded());
    assert!(!report.section().contains("Clinical history"));
    assert!(!report.section().contains("consensus"));

    let codes = report.encoded();
    assert_eq!(codes["Invasive Carcinoma"], "1");
    assert_eq!(codes["Histologic Type"], "1");
    assert_eq!(codes["Pathologic Stage"], "T1a N1mi");
    assert_eq!(codes["Nottingham Score"], "7");
    assert_eq!(codes["Histologic Grade"], "2");
    assert_eq!(codes.len(), pipeline.encoder().schema().len());
    assert!(outcome.malfunctions.is_empty());
    assert!(outcome.mostly_missing.is_empty());
}

#[test]
fn unrepairable_stage_is_a_malfunction_cell() {
    let pipeline = pathology_pipeline();
    let text = PATHOLOGY.replace("mpTla pNlmi", "see note");
    let outcome = pipeline.process_text("8", &text).unwrap();

    let codes = outcome.reports[0].encoded();
    assert_eq!(codes["Pathologic Stage"], MALFUNCTION_CODE);
    assert_eq!(codes["Invasive Carcinoma"], "1");
    assert_eq!(
        outcome.malfunctions,
        vec![("8".to_string(), "Pathologic Stage".to_string())]
    );
}

#[test]
fn bilateral_operative_report_yields_two_rows() {
    let schema = Schema::new(vec![column("Procedure"), column("Axillary Procedure")]).unwrap();
    let pipeline = Pipeline::new(
        Resources::new(schema, CodeBook::new()),
        PipelineOptions::new(ReportType::Alpha),
    )
    .unwrap();
    let outcome = pipeline.process_text("12", BILATERAL_OPERATIVE).unwrap();

    assert!(outcome.is_split());
    let ids: Vec<&str> = outcome.reports.iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["12L", "12R"]);

    let (left, right) = (&outcome.reports[0], &outcome.reports[1]);
    assert_eq!(left.laterality(), Laterality::Left);
    assert_eq!(right.laterality(), Laterality::Right);
    assert_eq!(left.encoded()["Procedure"], "lumpectomy");
    assert_eq!(left.encoded()["Axillary Procedure"], "sentinel node biopsy");
    assert_eq!(right.encoded()["Procedure"], "mastectomy");
    assert_eq!(right.encoded()["Axillary Procedure"], "none");
}

#[test]
fn batch_lists_reports_without_a_synoptic_section() {
    let pipeline = pathology_pipeline();
    let inputs = [
        ("3", "Clinical note without any structured summary."),
        ("7", PATHOLOGY),
        ("9", "Invasive Carcinoma Synoptic Report\nunrelated text\nComments: none"),
    ];
    let output = run_batch(&pipeline, inputs);

    assert_eq!(output.sources, 3);
    assert_eq!(output.reports.len(), 3);
    assert_eq!(output.no_synoptic, vec!["3".to_string()]);
    assert_eq!(output.mostly_missing, vec!["9".to_string()]);
    assert!(output.failed.is_empty());

    let skipped = &output.reports[0];
    assert!(skipped.is_no_synoptic());
    assert!(skipped.is_encoded());
    assert!(skipped.encoded().is_empty());
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write fixture");
    path
}

#[test]
fn resources_load_from_disk() {
    let dir = TempDir::new().unwrap();
    let paths = InputPaths {
        schema: write(
            dir.path(),
            "schema.csv",
            "primary,alternative,canonical,zero_empty\n\
             \"Invasive Carcinoma,Invasive carcinoma present\",,Invasive Carcinoma,false\n\
             Number of foci,Foci,Number of Foci,true\n",
        ),
        code_book: write(
            dir.path(),
            "codebook.csv",
            "canonical_column,code,synonyms\n\
             Invasive Carcinoma,0,\"not identified, absent\"\n\
             Invasive Carcinoma,1,\"present, identified\"\n",
        ),
        thresholds: Some(write(
            dir.path(),
            "thresholds.csv",
            "column,threshold\nInvasive Carcinoma,0.9\n",
        )),
        exclusions: Some(dir.path().join("exclusions.csv")),
        ..InputPaths::default()
    };
    let options = PipelineOptions {
        default_threshold: 0.7,
        ..PipelineOptions::new(ReportType::Numeric)
    };

    let resources = Resources::load(&paths, &options).unwrap();
    assert_eq!(resources.schema.len(), 2);
    let invasive = resources.schema.get("Invasive Carcinoma").unwrap();
    assert!((invasive.threshold - 0.9).abs() < f32::EPSILON);
    let foci = resources.schema.get("Number of Foci").unwrap();
    assert!((foci.threshold - 0.7).abs() < f32::EPSILON);
    assert!(foci.zero_empty);
    assert_eq!(resources.code_book.encodings("Invasive Carcinoma").len(), 2);
    assert!(resources.exclusions.is_empty());
    assert!(dir.path().join("exclusions.csv").exists());
    assert!(resources.lexicon.is_none());

    let pipeline = Pipeline::new(resources, options).unwrap();
    let outcome = pipeline
        .process_text(
            "21",
            "Cancer Summary\nInvasive carcinoma present: identified\nComments: none",
        )
        .unwrap();
    assert_eq!(outcome.reports[0].encoded()["Invasive Carcinoma"], "1");
}

#[test]
fn missing_schema_names_the_file() {
    let dir = TempDir::new().unwrap();
    let paths = InputPaths {
        schema: dir.path().join("absent.csv"),
        code_book: dir.path().join("codebook.csv"),
        ..InputPaths::default()
    };
    let err = Resources::load(&paths, &PipelineOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
}
