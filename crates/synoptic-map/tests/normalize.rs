use std::collections::BTreeMap;

use proptest::prelude::*;
use synoptic_map::{
    CompilerOptions, Extraction, Extractor, GenericPair, Normalizer, NormalizerOptions,
    RepairRules, edit_distance,
};
use synoptic_model::text::clean_label_key;
use synoptic_model::{AutocorrectOverride, Column, ExclusionSet, Schema, Value};

fn generic(pairs: &[(&str, &str)]) -> Extraction {
    Extraction {
        specific: BTreeMap::new(),
        generic: pairs
            .iter()
            .map(|(label, value)| GenericPair {
                label: (*label).to_string(),
                key: clean_label_key(label),
                value: (*value).to_string(),
            })
            .collect(),
    }
}

fn margin_schema() -> Schema {
    let mut closest = Column::new("Closest Margin", vec!["Closest margin".into()]);
    closest.autocorrect = AutocorrectOverride {
        substitution_cost: None,
        max_distance: Some(50),
    };
    Schema::new(vec![closest, Column::new("Grade", vec!["Grade".into()])]).unwrap()
}

#[test]
fn excluded_pair_is_never_rewritten() {
    let extraction = generic(&[("receptor", "anterior")]);

    let open = Normalizer::new(margin_schema(), ExclusionSet::new(), NormalizerOptions::default());
    let result = open.normalize("S1", extraction.clone(), "");
    assert_eq!(result.extractions["Closest Margin"].primary, "anterior");
    assert_eq!(result.audit.len(), 1);

    let exclusions: ExclusionSet = [("receptor", "closest margin")].into_iter().collect();
    let guarded = Normalizer::new(margin_schema(), exclusions, NormalizerOptions::default());
    let result = guarded.normalize("S1", extraction, "");
    assert!(!result.extractions.contains_key("Closest Margin"));
    assert!(result.audit.is_empty());
}

#[test]
fn specific_values_win_over_generic() {
    let schema = Schema::new(vec![Column::new("Grade", vec!["Grade".into()])]).unwrap();
    let mut extraction = generic(&[("Grade", "3")]);
    extraction
        .specific
        .insert("Grade".to_string(), Value::new("2"));
    let normalizer = Normalizer::new(schema, ExclusionSet::new(), NormalizerOptions::default());
    let result = normalizer.normalize("S2", extraction, "");
    assert_eq!(result.extractions["Grade"].primary, "2");
}

#[test]
fn ties_resolve_to_schema_order() {
    let schema = Schema::new(vec![
        Column::new("Grade B", vec!["Grade B".into()]),
        Column::new("Grade A", vec!["Grade A".into()]),
    ])
    .unwrap();
    let normalizer = Normalizer::new(schema, ExclusionSet::new(), NormalizerOptions::default());
    let result = normalizer.normalize("S3", generic(&[("Grade C", "x")]), "");
    assert_eq!(result.extractions.len(), 1);
    assert_eq!(result.extractions["Grade B"].primary, "x");
    let record = &result.audit.records()[0];
    assert_eq!(record.raw_label, "Grade C");
    assert_eq!(record.distance, 1);
}

#[test]
fn first_generic_label_claims_the_column() {
    let schema = Schema::new(vec![Column::new("Tumour Size", vec!["Tumour size".into()])]).unwrap();
    let normalizer = Normalizer::new(schema, ExclusionSet::new(), NormalizerOptions::default());
    let result = normalizer.normalize(
        "S4",
        generic(&[("Tumor size", "12 mm"), ("Tumour sise", "15 mm")]),
        "",
    );
    assert_eq!(result.extractions["Tumour Size"].primary, "12 mm");
    assert_eq!(result.audit.len(), 1);
}

#[test]
fn no_lymph_nodes_present_zeroes_counts() {
    let rules = RepairRules::default();
    let schema = Schema::new(vec![
        Column::new(
            rules.nodes_examined.clone(),
            vec!["Number of lymph nodes examined".into()],
        ),
        Column::new(
            rules.sentinel_nodes.clone(),
            vec!["Number of sentinel nodes examined".into()],
        ),
        Column::new(
            "Number of Lymph Nodes with Micrometastases",
            vec!["Number of lymph nodes with micrometastases".into()],
        ),
        Column::new(
            "Number of Lymph Nodes with Macrometastases",
            vec!["Number of lymph nodes with macrometastases".into()],
        ),
    ])
    .unwrap();
    let section = "\
Lymph nodes: No lymph nodes present
Number of lymph nodes with micrometastases: 1
";
    let extractor = Extractor::new(&schema, &CompilerOptions::default()).unwrap();
    let normalizer = Normalizer::new(schema, ExclusionSet::new(), NormalizerOptions::default());
    let result = normalizer.normalize("S5", extractor.extract(section), section);

    assert_eq!(result.extractions[&rules.nodes_examined].primary, "0");
    assert_eq!(result.extractions[&rules.sentinel_nodes].primary, "0");
    assert!(result.extractions["Number of Lymph Nodes with Micrometastases"].is_empty());
    assert!(result.extractions["Number of Lymph Nodes with Macrometastases"].is_empty());
}

#[test]
fn mostly_missing_report_is_flagged() {
    let schema = Schema::new(vec![
        Column::new("Grade", vec!["Grade".into()]),
        Column::new("Margins", vec!["Margins".into()]),
    ])
    .unwrap();
    let normalizer = Normalizer::new(schema, ExclusionSet::new(), NormalizerOptions::default());
    let result = normalizer.normalize("S6", Extraction::default(), "");
    assert!(result.mostly_missing);
    assert_eq!(result.missing, 2);
}

fn invariant_schema() -> Schema {
    Schema::new(vec![
        Column::new("Grade", vec!["Grade".into()]),
        Column::new("Margins", vec!["Margins".into()]),
        Column::new("Tumour Size", vec!["Tumour size".into()]),
        Column::new("Closest Margin", vec!["Closest margin".into()]),
    ])
    .unwrap()
}

proptest! {
    #[test]
    fn keys_stay_canonical_and_within_threshold(
        pairs in prop::collection::vec(("[a-z ]{1,16}", "[a-z0-9 ]{1,8}"), 0..8)
    ) {
        let schema = invariant_schema();
        let exclusions: ExclusionSet = [("margin", "margins")].into_iter().collect();
        let options = NormalizerOptions::default();
        let normalizer = Normalizer::new(schema.clone(), exclusions.clone(), options.clone());
        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(l, v)| (l.as_str(), v.as_str())).collect();
        let result = normalizer.normalize("P", generic(&borrowed), "");

        for key in result.extractions.keys() {
            prop_assert!(schema.contains(key));
        }
        for record in result.audit.records() {
            let column = schema.get(&record.canonical).unwrap();
            let distance = edit_distance(&clean_label_key(&record.raw_label), &column.cleaned(), 1);
            prop_assert_eq!(distance, record.distance);
            prop_assert!(distance <= options.autocorrect.max_distance_for(column));
            prop_assert!(!exclusions.is_excluded(&record.raw_label, &record.canonical));
        }
    }
}

#[test]
fn short_node_count_label_fills_the_long_column() {
    let rules = RepairRules::default();
    let schema = Schema::new(vec![Column::new(
        rules.nodes_examined.clone(),
        vec!["Number of lymph nodes examined (sentinel and nonsentinel)".into()],
    )])
    .unwrap();
    let normalizer = Normalizer::new(schema, ExclusionSet::new(), NormalizerOptions::default());
    let result = normalizer.normalize(
        "S6",
        generic(&[("Number of lymph nodes examined", "4")]),
        "Number of lymph nodes examined: 4",
    );

    assert_eq!(
        result.extractions.get(&rules.nodes_examined).map(|v| v.primary.as_str()),
        Some("4")
    );
    assert!(result.audit.is_empty());
}
