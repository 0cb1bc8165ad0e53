pub mod extract;
pub mod rules;
pub mod segment;
pub mod variants;

use tracing::warn;

use crate::record::SpecRecord;
use crate::sheets::RawDocument;
use self::rules::RuleSet;

/// Flag documents whose combined extraction yield falls below this many
/// fields for manual review.
const YIELD_FLOOR: usize = 12;

pub struct ParsedDocument {
    pub sku: String,
    pub records: Vec<SpecRecord>,
    pub field_count: usize,
    pub low_yield: bool,
}

/// Two-pass pipeline per document: lines → language blocks → per-language
/// field extraction (plus variant table recovery).
///
/// A document where no language passes the content threshold produces no
/// records; callers skip spec extraction without failing the batch.
pub fn process_document(doc: &RawDocument, rules: &RuleSet) -> ParsedDocument {
    let split = segment::separate_languages(&doc.lines, &rules.segmenter);

    let mut records = Vec::new();
    for (lang, text) in &split.texts {
        let Some(table) = rules.language(lang) else {
            continue;
        };
        records.push(extract::extract_record(&doc.sku, table, text, rules));
    }

    let field_count: usize = records.iter().map(SpecRecord::extracted_field_count).sum();
    let low_yield = field_count < YIELD_FLOOR;
    if low_yield {
        warn!(sku = %doc.sku, field_count, "low extraction yield; review manually");
    }

    ParsedDocument {
        sku: doc.sku.clone(),
        records,
        field_count,
        low_yield,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::sheets::RawDocument;

    fn doc(name: &str, text: &str) -> RawDocument {
        RawDocument {
            sku: name.to_string(),
            path: PathBuf::from(format!("{name}.txt")),
            lines: text.lines().map(String::from).collect(),
        }
    }

    fn fixture(name: &str) -> RawDocument {
        let path = PathBuf::from(format!("tests/fixtures/{name}"));
        let text = std::fs::read_to_string(&path).unwrap();
        RawDocument {
            sku: name.split('_').next().unwrap().to_string(),
            path,
            lines: text.lines().map(String::from).collect(),
        }
    }

    #[test]
    fn end_to_end_minimal_english_record() {
        let rules = RuleSet::standard().with_min_content_lines(1);
        let parsed = process_document(
            &doc(
                "DZ4505-0025",
                "Load Rating: up to 80,000 kg\nSlide Extension: 100 %\nCorrosion Resistant: No",
            ),
            &rules,
        );
        assert_eq!(parsed.records.len(), 1);
        let rec = &parsed.records[0];
        assert_eq!(rec.language, "en");
        assert_eq!(rec.load_rating.as_deref(), Some("80,000 kg"));
        assert_eq!(rec.slide_extension.as_deref(), Some("100 %"));
        assert_eq!(rec.corrosion_resistant.as_deref(), Some("No"));
        assert!(parsed.low_yield);
    }

    #[test]
    fn threshold_failure_produces_no_records() {
        let rules = RuleSet::standard();
        let parsed = process_document(&doc("DZ4505", "Load Rating: up to 80,000 kg"), &rules);
        assert!(parsed.records.is_empty());
        assert!(parsed.low_yield);
    }

    #[test]
    fn trilingual_fixture_yields_three_records() {
        let rules = RuleSet::standard();
        let parsed = process_document(&fixture("DB3832-0035EC-D_datasheet.txt"), &rules);
        assert_eq!(parsed.sku, "DB3832-0035EC-D");
        assert!(!parsed.low_yield, "only {} fields", parsed.field_count);

        let langs: Vec<&str> = parsed.records.iter().map(|r| r.language.as_str()).collect();
        assert_eq!(langs, vec!["de", "en", "fr"]);

        let en = parsed.records.iter().find(|r| r.language == "en").unwrap();
        assert_eq!(en.load_rating.as_deref(), Some("80,000 kg"));
        assert_eq!(en.slide_extension.as_deref(), Some("100 %"));
        assert_eq!(en.slide_height.as_deref(), Some("150.0 mm"));
        assert_eq!(en.max_slide_length.as_deref(), Some("2,000 mm"));
        assert_eq!(en.temperature_range.as_deref(), Some("-20 °C to +90 °C"));
        assert_eq!(en.corrosion_resistant.as_deref(), Some("Yes"));
        assert_eq!(en.unit_of_measure.as_deref(), Some("Pair"));
        assert_eq!(
            en.permitted_mounting.as_deref(),
            Some("Horizontal base mounting only")
        );
        assert_eq!(en.main_material.as_deref(), Some("Carbon steel"));
        assert_eq!(en.finish.as_deref(), Some("Zinc plated slide finish"));
        assert!(en.features.as_deref().unwrap().contains("Hardened steel balls"));
        assert!(en.notes.as_deref().unwrap().contains("DZ4501-EC"));
        assert!(en.related_products.contains("DZ4501-EC"));
        assert!(en
            .spare_parts
            .as_deref()
            .unwrap()
            .contains("Replacement ball retainer strip"));

        let fr = parsed.records.iter().find(|r| r.language == "fr").unwrap();
        assert_eq!(fr.load_rating.as_deref(), Some("80.000kg"));
        assert_eq!(fr.slide_extension.as_deref(), Some("100%"));
        assert_eq!(fr.slide_height.as_deref(), Some("150,0 mm"));
        assert_eq!(fr.temperature_range.as_deref(), Some("-20 °C à +90 °C"));
        assert_eq!(fr.main_material.as_deref(), Some("Acier au carbone"));
        assert_eq!(fr.finish.as_deref(), Some("Zingué brillant"));
        assert!(fr.features.as_deref().unwrap().contains("acier trempé"));

        let de = parsed.records.iter().find(|r| r.language == "de").unwrap();
        assert_eq!(de.load_rating.as_deref(), Some("80.000 kg"));
        assert_eq!(de.slide_height.as_deref(), Some("150,0 mm"));
        assert_eq!(de.temperature_range.as_deref(), Some("-20 °C bis +90 °C"));
        assert_eq!(de.main_material.as_deref(), Some("Stahl, kaltgewalzt"));
        assert_eq!(de.finish.as_deref(), Some("verzinkt"));
        assert!(de.notes.as_deref().unwrap().contains("DZ4501-EC"));
        assert!(de.related_products.contains("DZ4501-EC"));

        // the shared variant table lands in every language's record
        for rec in &parsed.records {
            assert_eq!(rec.variants.len(), 2, "{}", rec.language);
            assert_eq!(rec.variants[0]["sl"], "274");
            assert_eq!(rec.variants[1]["l1"], "1,524");
        }
    }
}
