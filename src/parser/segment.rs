use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::rules::SegmenterConfig;

static NUMERIC_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d.,-]+(?:\s+[\d.,-]+)*$").unwrap());
static DASH_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-+$").unwrap());
static SHORT_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{1,3}$").unwrap());

/// Result of splitting one document into per-language text.
#[derive(Debug, Default)]
pub struct LanguageSplit {
    /// language tag → joined text (shared lines already appended). Only
    /// languages that passed the content threshold appear; may be empty.
    pub texts: BTreeMap<String, String>,
    pub shared: String,
}

impl LanguageSplit {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Split raw datasheet lines into per-language blocks plus a shared block.
///
/// Table content (numbers, dashes, short header abbreviations) is shared;
/// every other line is assigned to the language whose keyword vocabulary
/// scores highest, with English as the tie/zero default. Languages with too
/// little real content are dropped, and shared lines are appended to every
/// survivor so rules anchored on section markers keep working no matter
/// which block a marker landed in.
pub fn separate_languages(lines: &[String], cfg: &SegmenterConfig) -> LanguageSplit {
    let mut shared: Vec<&str> = Vec::new();
    let mut by_lang: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (tag, _) in &cfg.vocabularies {
        by_lang.insert(*tag, Vec::new());
    }

    for raw in lines {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_shared(line, cfg) {
            shared.push(line);
            continue;
        }
        by_lang.entry(classify(line, cfg)).or_default().push(line);
    }

    let mut split = LanguageSplit {
        shared: shared.join("\n"),
        ..Default::default()
    };

    for (tag, lang_lines) in by_lang {
        let real = lang_lines
            .iter()
            .filter(|l| l.split_whitespace().count() > 2)
            .count();
        if real < cfg.min_content_lines {
            continue;
        }
        let mut text = lang_lines.join("\n");
        if !split.shared.is_empty() {
            text.push('\n');
            text.push_str(&split.shared);
        }
        split.texts.insert(tag.to_string(), text);
    }

    split
}

fn is_shared(line: &str, cfg: &SegmenterConfig) -> bool {
    NUMERIC_LINE_RE.is_match(line)
        || DASH_LINE_RE.is_match(line)
        || SHORT_TOKEN_RE.is_match(line)
        || cfg.shared_tokens.contains(&line)
}

fn classify<'c>(line: &str, cfg: &'c SegmenterConfig) -> &'c str {
    let lower = line.to_lowercase();
    let mut best = "en";
    let mut best_score = 0usize;
    let mut tied = false;

    for (tag, vocab) in &cfg.vocabularies {
        let score = vocab.iter().filter(|kw| lower.contains(*kw)).count();
        match score.cmp(&best_score) {
            std::cmp::Ordering::Greater => {
                best = *tag;
                best_score = score;
                tied = false;
            }
            std::cmp::Ordering::Equal if score > 0 => tied = true,
            _ => {}
        }
    }

    if best_score == 0 || tied {
        "en"
    } else {
        best
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    fn cfg(min: usize) -> SegmenterConfig {
        SegmenterConfig {
            min_content_lines: min,
            ..Default::default()
        }
    }

    #[test]
    fn english_only_lines_yield_en_block_only() {
        let doc = lines(
            "Load Rating: up to 80,000 kg\n\
             Slide Extension: 100 %\n\
             Slide Height: 150.0 mm\n\
             Permitted Mounting Orientations: Horizontal base mounting\n\
             Corrosion Resistant: Yes\n\
             Hardened steel balls for smooth slide movement\n\
             Temperature Range: -20 °C to +90 °C\n\
             Maximum Slide Length: 2,000 mm\n\
             Use spare parts from the accessories list\n\
             Slide Thickness: 9.5 mm\n\
             Zinc plated slide finish on all members",
        );
        let split = separate_languages(&doc, &cfg(10));
        assert!(split.texts.contains_key("en"));
        assert!(!split.texts.contains_key("fr"));
        assert!(!split.texts.contains_key("de"));
    }

    #[test]
    fn too_little_content_yields_empty_mapping() {
        let doc = lines("Load Rating: up to 80,000 kg\nCorrosion Resistant: Yes");
        let split = separate_languages(&doc, &cfg(10));
        assert!(split.is_empty());
    }

    #[test]
    fn shared_lines_go_to_every_surviving_language() {
        let mut doc = Vec::new();
        for _ in 0..10 {
            doc.push("Hardened steel slide with load detents".to_string());
            doc.push("Glissière en acier avec billes trempées pour la charge".to_string());
        }
        doc.push("SL".to_string());
        doc.push("1,219".to_string());
        let split = separate_languages(&doc, &cfg(10));
        assert_eq!(split.shared, "SL\n1,219");
        for text in split.texts.values() {
            assert!(text.ends_with("SL\n1,219"));
        }
        assert!(split.texts.contains_key("en"));
        assert!(split.texts.contains_key("fr"));
    }

    #[test]
    fn numeric_dash_and_short_tokens_are_shared() {
        let doc = lines("274 320 130\n----\nTR\n9.5\nmm");
        let split = separate_languages(&doc, &cfg(1));
        assert!(split.texts.is_empty());
        assert_eq!(split.shared.lines().count(), 5);
    }

    #[test]
    fn zero_score_defaults_to_english() {
        let doc: Vec<String> = (0..10)
            .map(|i| format!("Completely neutral wording number {i}"))
            .collect();
        let split = separate_languages(&doc, &cfg(10));
        assert!(split.texts.contains_key("en"));
        assert_eq!(split.texts.len(), 1);
    }
}
