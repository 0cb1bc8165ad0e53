use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One parsed row of a dimensional/load variant table, keyed by the
/// lower-cased column header.
pub type VariantRow = BTreeMap<String, String>;

/// Structured spec record for one (product, language) pair.
///
/// Sparse by design: a field the datasheet did not yield is `None` and is
/// omitted from serialized output, never written as null. `related_products`
/// and `variants` are always present, possibly empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecRecord {
    pub product_id: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_thickness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_slide_length: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permitted_mounting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_mounting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flat_mounting_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrosion_resistant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ball_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retainer_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spare_parts: Option<String>,
    #[serde(default)]
    pub related_products: BTreeSet<String>,
    #[serde(default)]
    pub variants: Vec<VariantRow>,
}

/// Stable field names, in persisted-schema order. Drives the generic rule
/// scanner and the SQLite column layout.
pub const FIELD_NAMES: &[&str] = &[
    "load_rating",
    "slide_extension",
    "slide_height",
    "slide_thickness",
    "max_slide_length",
    "temperature_range",
    "permitted_mounting",
    "other_mounting",
    "flat_mounting_note",
    "corrosion_resistant",
    "unit_of_measure",
    "features",
    "main_material",
    "ball_material",
    "retainer_material",
    "finish",
    "fixing",
    "notes",
    "accessories",
    "spare_parts",
];

impl SpecRecord {
    pub fn new(product_id: &str, language: &str) -> Self {
        SpecRecord {
            product_id: product_id.to_string(),
            language: language.to_string(),
            ..Default::default()
        }
    }

    pub fn set(&mut self, field: &str, value: String) {
        *self.slot_mut(field) = Some(value);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "load_rating" => self.load_rating.as_deref(),
            "slide_extension" => self.slide_extension.as_deref(),
            "slide_height" => self.slide_height.as_deref(),
            "slide_thickness" => self.slide_thickness.as_deref(),
            "max_slide_length" => self.max_slide_length.as_deref(),
            "temperature_range" => self.temperature_range.as_deref(),
            "permitted_mounting" => self.permitted_mounting.as_deref(),
            "other_mounting" => self.other_mounting.as_deref(),
            "flat_mounting_note" => self.flat_mounting_note.as_deref(),
            "corrosion_resistant" => self.corrosion_resistant.as_deref(),
            "unit_of_measure" => self.unit_of_measure.as_deref(),
            "features" => self.features.as_deref(),
            "main_material" => self.main_material.as_deref(),
            "ball_material" => self.ball_material.as_deref(),
            "retainer_material" => self.retainer_material.as_deref(),
            "finish" => self.finish.as_deref(),
            "fixing" => self.fixing.as_deref(),
            "notes" => self.notes.as_deref(),
            "accessories" => self.accessories.as_deref(),
            "spare_parts" => self.spare_parts.as_deref(),
            _ => None,
        }
    }

    fn slot_mut(&mut self, field: &str) -> &mut Option<String> {
        match field {
            "load_rating" => &mut self.load_rating,
            "slide_extension" => &mut self.slide_extension,
            "slide_height" => &mut self.slide_height,
            "slide_thickness" => &mut self.slide_thickness,
            "max_slide_length" => &mut self.max_slide_length,
            "temperature_range" => &mut self.temperature_range,
            "permitted_mounting" => &mut self.permitted_mounting,
            "other_mounting" => &mut self.other_mounting,
            "flat_mounting_note" => &mut self.flat_mounting_note,
            "corrosion_resistant" => &mut self.corrosion_resistant,
            "unit_of_measure" => &mut self.unit_of_measure,
            "features" => &mut self.features,
            "main_material" => &mut self.main_material,
            "ball_material" => &mut self.ball_material,
            "retainer_material" => &mut self.retainer_material,
            "finish" => &mut self.finish,
            "fixing" => &mut self.fixing,
            "notes" => &mut self.notes,
            "accessories" => &mut self.accessories,
            "spare_parts" => &mut self.spare_parts,
            other => panic!("unknown spec field: {other}"),
        }
    }

    /// Count of fields that actually carry data. Feeds the low-yield check.
    pub fn extracted_field_count(&self) -> usize {
        let mut n = FIELD_NAMES.iter().filter(|f| self.get(f).is_some()).count();
        if !self.related_products.is_empty() {
            n += 1;
        }
        if !self.variants.is_empty() {
            n += 1;
        }
        n
    }
}

/// Fixed whitelist copied from a parent record onto children that lack their
/// own datasheet-derived spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritedSpecs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_thickness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features_summary: Option<String>,
}

impl InheritedSpecs {
    pub fn from_parent(spec: &SpecRecord) -> Self {
        InheritedSpecs {
            load_rating: spec.load_rating.clone(),
            slide_extension: spec.slide_extension.clone(),
            slide_height: spec.slide_height.clone(),
            slide_thickness: spec.slide_thickness.clone(),
            temperature_range: spec.temperature_range.clone(),
            main_material: spec.main_material.clone(),
            finish: spec.finish.clone(),
            features_summary: spec.features.clone(),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_from_json() {
        let mut rec = SpecRecord::new("DZ4505-0025", "en");
        rec.set("load_rating", "80,000 kg".into());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["load_rating"], "80,000 kg");
        assert!(json.get("slide_height").is_none());
        // always-present collections serialize even when empty
        assert!(json["related_products"].as_array().unwrap().is_empty());
        assert!(json["variants"].as_array().unwrap().is_empty());
    }

    #[test]
    fn field_count_ignores_empty_collections() {
        let mut rec = SpecRecord::new("DZ4505", "en");
        assert_eq!(rec.extracted_field_count(), 0);
        rec.set("finish", "Zinc plated".into());
        rec.related_products.insert("DZ4501-EC".into());
        assert_eq!(rec.extracted_field_count(), 2);
    }

    #[test]
    fn inherited_specs_take_features_as_summary() {
        let mut rec = SpecRecord::new("DB3832-EC-D", "en");
        rec.set("features", "Hold in detent".into());
        rec.set("notes", "internal".into());
        let inh = InheritedSpecs::from_parent(&rec);
        assert_eq!(inh.features_summary.as_deref(), Some("Hold in detent"));
        // notes are deliberately not part of the whitelist
        let json = serde_json::to_value(&inh).unwrap();
        assert!(json.get("notes").is_none());
    }
}
