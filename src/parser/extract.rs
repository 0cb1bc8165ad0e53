use crate::record::SpecRecord;

use super::rules::{CompiledCapture, CompiledRule, LanguageRules, RuleSet};
use super::variants;

/// Run one language's rule table over that language's text.
///
/// Anchor+terminator matching, not fixed offsets: vendor layouts shuffle
/// section order and spacing across languages, so each rule independently
/// locates its label and captures up to the next known section boundary.
/// A missing label simply omits the field from the sparse record.
pub fn extract_record(
    product_id: &str,
    table: &LanguageRules,
    text: &str,
    rules: &RuleSet,
) -> SpecRecord {
    let mut rec = SpecRecord::new(product_id, table.language);

    for rule in &table.rules {
        if let Some(value) = apply_rule(rule, text) {
            rec.set(rule.field, value);
        }
    }

    rec.related_products = related_products(rec.notes.as_deref(), rules);
    rec.variants = variants::parse_variant_table(text);
    rec
}

fn apply_rule(rule: &CompiledRule, text: &str) -> Option<String> {
    let caps = rule.label.captures(text)?;
    let value = match &rule.capture {
        CompiledCapture::Inline => caps.get(1)?.as_str(),
        CompiledCapture::Section {
            terminator,
            open_ended,
        } => {
            let tail = &text[caps.get(0)?.end()..];
            match terminator.find(tail) {
                Some(m) => &tail[..m.start()],
                None if *open_ended => tail,
                None => return None,
            }
        }
    };
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// SKU-shaped tokens mentioned in the notes section, deduplicated. Absent
/// notes yield an empty set, not an omitted field.
fn related_products(
    notes: Option<&str>,
    rules: &RuleSet,
) -> std::collections::BTreeSet<String> {
    let Some(notes) = notes else {
        return Default::default();
    };
    rules
        .sku_token
        .find_iter(notes)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ── Tests ──
