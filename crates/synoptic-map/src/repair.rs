//! Column repair rules applied after label normalization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use synoptic_model::text::{clean_label_key, clean_text, spaceless};
use synoptic_model::{Schema, Value};
use tracing::debug;

/// Canonical column names the repair rules act on. Rules touching columns
/// missing from the schema are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairRules {
    /// Short form renamed to `nodes_examined`.
    pub nodes_examined_short: String,
    pub nodes_examined: String,
    pub sentinel_nodes: String,
    /// Nulled when the section says no lymph nodes are present.
    pub node_metrics: Vec<String>,
    pub number_of_foci: String,
    pub focality: String,
    pub histologic_type: String,
    pub in_situ_component: String,
    pub in_situ_type: String,
    /// `(margin, dcis margin)` pairs moved when DCIS is absent.
    pub dcis_margins: Vec<(String, String)>,
}

impl Default for RepairRules {
    fn default() -> Self {
        Self {
            nodes_examined_short: "Number of Lymph Nodes Examined".into(),
            nodes_examined: "Number of Lymph Nodes Examined (sentinel and nonsentinel)".into(),
            sentinel_nodes: "Number of Sentinel Nodes Examined".into(),
            node_metrics: vec![
                "Number of Lymph Nodes with Micrometastases".into(),
                "Number of Lymph Nodes with Macrometastases".into(),
                "Number of Lymph Nodes with Isolated Tumour Cells".into(),
                "Size of Largest Nodal Metastatic Deposit".into(),
                "Extranodal Extension".into(),
            ],
            number_of_foci: "Number of Foci".into(),
            focality: "Tumour Focality".into(),
            histologic_type: "Histologic Type".into(),
            in_situ_component: "In Situ Component".into(),
            in_situ_type: "In Situ Component Type".into(),
            dcis_margins: vec![
                ("Margins".into(), "DCIS Margins".into()),
                ("Closest Margin".into(), "Closest Margin to DCIS".into()),
                (
                    "Distance from Closest Margin".into(),
                    "Distance of DCIS from Closest Margin".into(),
                ),
            ],
        }
    }
}

fn is_vacant(extractions: &BTreeMap<String, Value>, column: &str) -> bool {
    extractions.get(column).is_none_or(Value::is_empty)
}

impl RepairRules {
    /// Applies every rule in a fixed order.
    pub fn apply(&self, schema: &Schema, section: &str, extractions: &mut BTreeMap<String, Value>) {
        self.rename_nodes_examined(schema, extractions);
        self.inherit_foci(schema, extractions);
        self.backfill_in_situ(schema, extractions);

        let compact = spaceless(section);
        if compact.contains("nolymphnodespresent") {
            self.zero_lymph_nodes(schema, extractions);
        }
        if compact.contains("negativefordcis") {
            self.move_dcis_margins(schema, extractions);
        }
    }

    /// Column a generic label is moved to without edit-distance matching.
    /// Only the short node-count label has one.
    pub fn renamed_column(&self, schema: &Schema, key: &str) -> Option<&str> {
        if self.nodes_examined_short == self.nodes_examined
            || !schema.contains(&self.nodes_examined)
            || key != clean_label_key(&self.nodes_examined_short)
        {
            return None;
        }
        Some(self.nodes_examined.as_str())
    }

    fn rename_nodes_examined(&self, schema: &Schema, extractions: &mut BTreeMap<String, Value>) {
        if self.nodes_examined_short == self.nodes_examined
            || !schema.contains(&self.nodes_examined)
        {
            return;
        }
        let Some(value) = extractions.remove(&self.nodes_examined_short) else {
            return;
        };
        if is_vacant(extractions, &self.nodes_examined) {
            debug!(from = %self.nodes_examined_short, to = %self.nodes_examined, "renamed node count");
            extractions.insert(self.nodes_examined.clone(), value);
        } else if schema.contains(&self.nodes_examined_short) {
            extractions.insert(self.nodes_examined_short.clone(), value);
        }
    }

    fn inherit_foci(&self, schema: &Schema, extractions: &mut BTreeMap<String, Value>) {
        if !schema.contains(&self.number_of_foci) || !is_vacant(extractions, &self.number_of_foci) {
            return;
        }
        if let Some(focality) = extractions.get(&self.focality).filter(|v| !v.is_empty()) {
            let inherited = focality.clone();
            extractions.insert(self.number_of_foci.clone(), inherited);
        }
    }

    fn backfill_in_situ(&self, schema: &Schema, extractions: &mut BTreeMap<String, Value>) {
        let Some(histologic) = extractions.get(&self.histologic_type) else {
            return;
        };
        let cleaned = clean_text(&histologic.primary);
        let in_situ = cleaned.contains("in situ")
            || cleaned.split(' ').any(|w| w == "dcis" || w == "lcis");
        if !in_situ {
            return;
        }
        let phrase = histologic.primary.clone();
        if schema.contains(&self.in_situ_component) && is_vacant(extractions, &self.in_situ_component)
        {
            extractions.insert(self.in_situ_component.clone(), Value::new("present"));
        }
        if schema.contains(&self.in_situ_type) && is_vacant(extractions, &self.in_situ_type) {
            extractions.insert(self.in_situ_type.clone(), Value::new(phrase));
        }
    }

    fn zero_lymph_nodes(&self, schema: &Schema, extractions: &mut BTreeMap<String, Value>) {
        for count in [&self.nodes_examined, &self.sentinel_nodes] {
            if schema.contains(count) {
                extractions.insert(count.clone(), Value::new("0"));
            }
        }
        for metric in &self.node_metrics {
            if schema.contains(metric) {
                extractions.insert(metric.clone(), Value::empty());
            }
        }
    }

    fn move_dcis_margins(&self, schema: &Schema, extractions: &mut BTreeMap<String, Value>) {
        for (margin, dcis) in &self.dcis_margins {
            if !schema.contains(margin) {
                continue;
            }
            let value = extractions.insert(margin.clone(), Value::empty());
            if let Some(value) = value.filter(|v| !v.is_empty())
                && schema.contains(dcis)
                && is_vacant(extractions, dcis)
            {
                extractions.insert(dcis.clone(), value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use synoptic_model::Column;

    use super::*;

    fn schema(names: &[&str]) -> Schema {
        Schema::new(
            names
                .iter()
                .map(|n| Column::new(*n, vec![(*n).to_string()]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn foci_inherit_focality() {
        let schema = schema(&["Number of Foci", "Tumour Focality"]);
        let mut extractions =
            BTreeMap::from([("Tumour Focality".to_string(), Value::new("single focus"))]);
        RepairRules::default().apply(&schema, "", &mut extractions);
        assert_eq!(extractions["Number of Foci"].primary, "single focus");
    }

    #[test]
    fn in_situ_histology_backfills_component() {
        let schema = schema(&["Histologic Type", "In Situ Component", "In Situ Component Type"]);
        let mut extractions = BTreeMap::from([(
            "Histologic Type".to_string(),
            Value::new("Ductal carcinoma in situ"),
        )]);
        RepairRules::default().apply(&schema, "", &mut extractions);
        assert_eq!(extractions["In Situ Component"].primary, "present");
        assert_eq!(
            extractions["In Situ Component Type"].primary,
            "Ductal carcinoma in situ"
        );
    }

    #[test]
    fn short_node_count_is_renamed() {
        let rules = RepairRules::default();
        let schema = schema(&[rules.nodes_examined_short.as_str(), rules.nodes_examined.as_str()]);
        let mut extractions =
            BTreeMap::from([(rules.nodes_examined_short.clone(), Value::new("4"))]);
        rules.apply(&schema, "", &mut extractions);
        assert!(!extractions.contains_key(&rules.nodes_examined_short));
        assert_eq!(extractions[&rules.nodes_examined].primary, "4");
    }

    #[test]
    fn negative_for_dcis_moves_margins() {
        let schema = schema(&["Margins", "DCIS Margins"]);
        let mut extractions =
            BTreeMap::from([("Margins".to_string(), Value::new("negative, 5 mm"))]);
        RepairRules::default().apply(&schema, "Margins: Negative for DCIS", &mut extractions);
        assert!(extractions["Margins"].is_empty());
        assert_eq!(extractions["DCIS Margins"].primary, "negative, 5 mm");
    }
}
