use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::family::{fix_parent_sku, normalize_family};
use crate::record::{InheritedSpecs, SpecRecord};
use crate::sheets::is_valid_sku;

// ── Raw catalog shapes ──

/// Catalog dumps come either wrapped (`{"items": [...]}`) or as a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { items: Vec<RawProduct> },
    Bare(Vec<RawProduct>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub custom_attributes: Vec<RawAttribute>,
}

/// Attribute values arrive as strings, numbers or arrays depending on the
/// code, so they stay as raw JSON until mapped.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAttribute {
    pub attribute_code: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RawProduct {
    fn attribute(&self, code: &str) -> Option<&serde_json::Value> {
        self.custom_attributes
            .iter()
            .find(|a| a.attribute_code == code)
            .map(|a| &a.value)
    }

    fn attribute_str(&self, code: &str) -> Option<String> {
        let value = self.attribute(code)?.as_str()?.trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

// ── Cleaned product ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub sku: String,
    pub name: String,
    pub description: String,
    pub features: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    pub corrosion_resistant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_of_manufacture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasheet_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_specs: Option<SpecRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherited_specs: Option<InheritedSpecs>,
}

pub fn load_catalog(path: &Path) -> Result<Vec<RawProduct>, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::CatalogRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let file: CatalogFile =
        serde_json::from_str(&text).map_err(|e| PipelineError::CatalogRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(match file {
        CatalogFile::Wrapped { items } => items,
        CatalogFile::Bare(items) => items,
    })
}

/// Merge duplicate SKUs, preferring non-empty values. First occurrence wins
/// on conflicts; later duplicates only fill gaps.
pub fn dedupe_by_sku(items: Vec<RawProduct>) -> Vec<RawProduct> {
    let mut order: Vec<String> = Vec::new();
    let mut merged: BTreeMap<String, RawProduct> = BTreeMap::new();

    for item in items {
        if item.sku.is_empty() {
            continue;
        }
        match merged.get_mut(&item.sku) {
            None => {
                order.push(item.sku.clone());
                merged.insert(item.sku.clone(), item);
            }
            Some(kept) => {
                if kept.name.is_empty() && !item.name.is_empty() {
                    kept.name = item.name;
                }
                if kept.weight.is_none() {
                    kept.weight = item.weight;
                }
                for attr in item.custom_attributes {
                    if kept.attribute(&attr.attribute_code).is_none() {
                        kept.custom_attributes.push(attr);
                    }
                }
            }
        }
    }
    order
        .into_iter()
        .filter_map(|sku| merged.remove(&sku))
        .collect()
}

// ── Text cleaning ──

/// Vendor exports double-escape some unicode sequences; undo the common ones.
const ESCAPE_TABLE: &[(&str, &str)] = &[
    (r"°", "°"),
    (r"ä", "ä"),
    (r"ü", "ü"),
    (r"ö", "ö"),
    (r"ß", "ß"),
    (r"Ä", "Ä"),
    (r"Ü", "Ü"),
    (r"Ö", "Ö"),
];

pub fn clean_escapes(text: &str) -> String {
    let mut out = text.to_string();
    for (pat, rep) in ESCAPE_TABLE {
        if out.contains(pat) {
            out = out.replace(pat, rep);
        }
    }
    out
}

pub fn clean_text(text: &str) -> String {
    clean_escapes(text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Spec lookup ──

/// Immutable spec lookup keyed by raw SKU, repaired SKU and family key.
/// English records win over other languages on key collisions.
pub struct SpecIndex {
    by_key: BTreeMap<String, SpecRecord>,
}

impl SpecIndex {
    pub fn build(records: &[SpecRecord]) -> Self {
        let mut by_key: BTreeMap<String, SpecRecord> = BTreeMap::new();
        for rec in records {
            let fixed = fix_parent_sku(&rec.product_id);
            let mut keys = vec![rec.product_id.clone(), fixed.clone(), normalize_family(&fixed)];
            keys.dedup();
            for key in keys {
                match by_key.get(&key) {
                    Some(existing) if existing.language == "en" && rec.language != "en" => {}
                    _ => {
                        by_key.insert(key, rec.clone());
                    }
                }
            }
        }
        SpecIndex { by_key }
    }

    pub fn lookup(&self, key: &str) -> Option<&SpecRecord> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

// ── Mapping ──

/// Map one raw catalog entry to its cleaned form, attaching extracted specs
/// when the datasheet reference or SKU resolves against the index. Invalid
/// SKUs yield `None` and are skipped by the caller.
pub fn map_product(raw: &RawProduct, specs: &SpecIndex) -> Option<CatalogProduct> {
    if !is_valid_sku(&raw.sku) {
        warn!(sku = %raw.sku, "invalid catalog SKU; skipping");
        return None;
    }

    let datasheet_ref = raw.attribute_str("download_datasheet");

    // Datasheet attribute beats SKU-based matching.
    let mut pdf_specs = datasheet_ref
        .as_deref()
        .and_then(|r| specs.lookup(r))
        .cloned();
    if let Some(spec) = &pdf_specs {
        debug!(sku = %raw.sku, spec = %spec.product_id, "spec matched via datasheet attribute");
    } else {
        pdf_specs = specs.lookup(&raw.sku).cloned();
    }

    let length_mm = raw
        .attribute_str("length")
        .and_then(|l| l.parse::<i64>().ok());
    let category_id = raw.attribute("category_ids").and_then(|v| match v {
        serde_json::Value::Array(ids) => ids.first().map(json_scalar),
        _ => None,
    });

    Some(CatalogProduct {
        sku: raw.sku.clone(),
        name: clean_text(&raw.name),
        description: clean_text(&raw.attribute_str("description").unwrap_or_default()),
        features: clean_text(&raw.attribute_str("product_features").unwrap_or_default()),
        length_mm,
        weight_kg: raw.weight,
        corrosion_resistant: raw.attribute_str("corrosion_resistant").as_deref() == Some("1"),
        uom: raw.attribute_str("uom"),
        country_of_manufacture: raw.attribute_str("country_of_manufacture"),
        category_id,
        datasheet_ref,
        parent_sku: None,
        pdf_specs,
        inherited_specs: None,
    })
}

fn json_scalar(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Full ingestion: load, dedupe, map, attach specs.
pub fn build_products(path: &Path, specs: &SpecIndex) -> Result<Vec<CatalogProduct>, PipelineError> {
    let raw = dedupe_by_sku(load_catalog(path)?);
    Ok(raw.iter().filter_map(|r| map_product(r, specs)).collect())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> RawProduct {
        serde_json::from_value(json).unwrap()
    }

    fn product(sku: &str) -> RawProduct {
        raw(serde_json::json!({
            "sku": sku,
            "name": format!("{sku} slide"),
            "weight": 4.2,
            "custom_attributes": [
                {"attribute_code": "description", "value": "Heavy  duty \\u00b0 rated"},
                {"attribute_code": "product_features", "value": "Hold in detent"},
                {"attribute_code": "length", "value": "500"},
                {"attribute_code": "uom", "value": "Pair"},
                {"attribute_code": "corrosion_resistant", "value": "1"},
                {"attribute_code": "category_ids", "value": ["42", "97"]},
                {"attribute_code": "download_datasheet", "value": "DB3832-EC-D"},
            ],
        }))
    }

    fn spec(sku: &str, lang: &str) -> SpecRecord {
        let mut s = SpecRecord::new(sku, lang);
        s.load_rating = Some("80,000 kg".into());
        s
    }

    #[test]
    fn attribute_mapping() {
        let index = SpecIndex::build(&[]);
        let p = map_product(&product("DZ4505-0025"), &index).unwrap();
        assert_eq!(p.description, "Heavy duty ° rated");
        assert_eq!(p.features, "Hold in detent");
        assert_eq!(p.length_mm, Some(500));
        assert_eq!(p.weight_kg, Some(4.2));
        assert!(p.corrosion_resistant);
        assert_eq!(p.uom.as_deref(), Some("Pair"));
        assert_eq!(p.category_id.as_deref(), Some("42"));
        assert_eq!(p.datasheet_ref.as_deref(), Some("DB3832-EC-D"));
    }

    #[test]
    fn invalid_sku_is_skipped() {
        let index = SpecIndex::build(&[]);
        assert!(map_product(&raw(serde_json::json!({"sku": "??"})), &index).is_none());
    }

    #[test]
    fn dedupe_prefers_non_empty() {
        let a = raw(serde_json::json!({"sku": "DZ4505", "name": ""}));
        let b = raw(serde_json::json!({
            "sku": "DZ4505",
            "name": "Telescopic slide",
            "custom_attributes": [{"attribute_code": "uom", "value": "Each"}],
        }));
        let out = dedupe_by_sku(vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Telescopic slide");
        assert_eq!(out[0].attribute_str("uom").as_deref(), Some("Each"));
    }

    #[test]
    fn escape_cleaning() {
        assert_eq!(clean_escapes(r"45 °C, geprüft"), "45 °C, geprüft");
        assert_eq!(clean_text("a  b\n\tc"), "a b c");
    }

    #[test]
    fn datasheet_attribute_beats_sku_match() {
        let index = SpecIndex::build(&[spec("DB3832-0035EC-D", "en"), spec("DZ4505-0025", "en")]);
        let p = map_product(&product("DZ4505-0025"), &index).unwrap();
        // download_datasheet points at the DB3832 family key
        assert_eq!(
            p.pdf_specs.unwrap().product_id,
            "DB3832-0035EC-D"
        );
    }

    #[test]
    fn index_resolves_family_and_repaired_keys() {
        let index = SpecIndex::build(&[spec("DZ4501-0040EC", "en")]);
        assert!(index.lookup("DZ4501-0040EC").is_some());
        assert!(index.lookup("DZ4501-EC").is_some());
        assert!(index.lookup("DZ9999").is_none());
    }

    #[test]
    fn english_record_wins_index_collisions() {
        let index = SpecIndex::build(&[spec("DB3832-0035EC-D", "de"), spec("DB3832-0035EC-D", "en")]);
        assert_eq!(index.lookup("DB3832-EC-D").unwrap().language, "en");
    }

    #[test]
    fn wrapped_and_bare_files_parse() {
        let wrapped: CatalogFile =
            serde_json::from_str(r#"{"items": [{"sku": "DZ4505"}]}"#).unwrap();
        let bare: CatalogFile = serde_json::from_str(r#"[{"sku": "DZ4505"}]"#).unwrap();
        for file in [wrapped, bare] {
            let items = match file {
                CatalogFile::Wrapped { items } => items,
                CatalogFile::Bare(items) => items,
            };
            assert_eq!(items[0].sku, "DZ4505");
        }
    }
}
