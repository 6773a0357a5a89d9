use synoptic_ingest::{SectionIsolator, SectionRules};
use synoptic_model::{Laterality, Report, ReportType};

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

#[test]
fn bilateral_operative_report_splits_into_two_halves() {
    let isolator = SectionIsolator::for_report_type(ReportType::Alpha).unwrap();
    let isolation = isolator.isolate(BILATERAL_OPERATIVE);

    assert!(!isolation.no_synoptic);
    assert_eq!(isolation.laterality, Laterality::Bilateral);
    assert_eq!(isolation.sections.len(), 2);

    let left = &isolation.sections[0];
    let right = &isolation.sections[1];
    assert_eq!(left.laterality, Laterality::Left);
    assert_eq!(right.laterality, Laterality::Right);
    assert!(left.text.starts_with("Surgeon: staff"));
    assert!(left.text.contains("lumpectomy"));
    assert!(!left.text.contains("mastectomy"));
    assert!(right.text.contains("mastectomy"));
    assert!(!right.text.contains("lumpectomy"));

    let report = Report::new("12", ReportType::Alpha, BILATERAL_OPERATIVE);
    let ids: Vec<String> = isolation
        .sections
        .iter()
        .map(|s| report.split_half(s.text.clone(), s.laterality).unwrap().id().to_string())
        .collect();
    assert_eq!(ids, vec!["12L", "12R"]);
}

#[test]
fn bilateral_with_one_side_present_yields_single_section() {
    let text = "\
Preoperative diagnosis: left and right breast lesions
Synoptic Operative Report
Left breast:
Procedure: lumpectomy
Electronically signed
";
    let isolator = SectionIsolator::for_report_type(ReportType::Alpha).unwrap();
    let isolation = isolator.isolate(text);
    assert_eq!(isolation.sections.len(), 1);
    assert_eq!(isolation.laterality, Laterality::Left);
    assert_eq!(isolation.sections[0].laterality, Laterality::Left);
    assert!(!isolation.is_split());
}

#[test]
fn pathology_blocks_take_side_from_parts_involved() {
    let text = "\
Invasive Carcinoma Synoptic Report
Part(s) involved: A: Left breast
Tumour size: 12 mm
Invasive Carcinoma Synoptic Report
Part(s) involved: B: Right breast
Tumour size: 30 mm
Electronically signed
";
    let isolator = SectionIsolator::for_report_type(ReportType::Numeric).unwrap();
    let isolation = isolator.isolate(text);

    assert_eq!(isolation.laterality, Laterality::Bilateral);
    assert_eq!(isolation.sections.len(), 2);
    assert_eq!(isolation.sections[0].laterality, Laterality::Left);
    assert!(isolation.sections[0].text.contains("12 mm"));
    assert_eq!(isolation.sections[1].laterality, Laterality::Right);
    assert!(isolation.sections[1].text.contains("30 mm"));
}

#[test]
fn missing_section_keeps_raw_text() {
    let text = "Clinical note without any structured summary.";
    let isolator = SectionIsolator::for_report_type(ReportType::Numeric).unwrap();
    let isolation = isolator.isolate(text);
    assert!(isolation.no_synoptic);
    assert_eq!(isolation.sections.len(), 1);
    assert_eq!(isolation.sections[0].text, text);
}

#[test]
fn anchors_are_tried_in_priority_order() {
    let rules = SectionRules::from_toml_str(
        r#"
        [[anchors]]
        start = "never present"
        end = "x"

        [[anchors]]
        start = "begin:"
        end = "stop"
        "#,
    )
    .unwrap();
    let isolator = SectionIsolator::new(ReportType::Numeric, &rules).unwrap();
    let isolation = isolator.isolate("begin: Grade: 2 stop trailing");
    assert_eq!(isolation.sections[0].text, "Grade: 2");
    assert_eq!(isolation.laterality, Laterality::Unknown);
}
