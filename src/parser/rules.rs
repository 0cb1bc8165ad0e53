use regex::Regex;

/// How a rule captures its value once the label is found.
#[derive(Debug, Clone, Copy)]
pub enum Capture {
    /// The label regex itself carries the value in capture group 1.
    Inline,
    /// Capture from the end of the label match up to the earliest terminator
    /// match. `open_ended` rules fall back to end-of-text when the terminator
    /// never appears; others yield nothing.
    Section {
        terminator: &'static str,
        open_ended: bool,
    },
}

/// Declarative field rule: (field name, label pattern, value capture shape).
/// The scanner in extract.rs is the only interpreter of these tables.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: &'static str,
    pub label: &'static str,
    pub capture: Capture,
}

/// Terminator that can never match; used by tail rules that run to
/// end-of-text.
const NEVER: &str = r"[^\s\S]";

const fn section(terminator: &'static str) -> Capture {
    Capture::Section {
        terminator,
        open_ended: false,
    }
}

const fn tail(terminator: &'static str) -> Capture {
    Capture::Section {
        terminator,
        open_ended: true,
    }
}

pub const EN_RULES: &[FieldRule] = &[
    FieldRule { field: "load_rating", label: r"(?i)Load Rating[:\s]+up to ([\d.,]+ kg)", capture: Capture::Inline },
    FieldRule { field: "slide_extension", label: r"(?i)Slide Extension[:\s]+(\d+ %)", capture: Capture::Inline },
    FieldRule { field: "slide_height", label: r"(?i)Slide Height[:\s]+([\d.]+ mm)", capture: Capture::Inline },
    FieldRule { field: "slide_thickness", label: r"(?i)Slide Thickness[:\s]+([\d.]+ mm)", capture: Capture::Inline },
    FieldRule { field: "max_slide_length", label: r"(?i)Maximum Slide Length[:\s]+([\d,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "temperature_range", label: r"(?i)Temperature Range[:\s]+(-?\d+ °C to \+?\d+ °C)", capture: Capture::Inline },
    FieldRule { field: "permitted_mounting", label: r"(?i)Permitted Mounting Orientations:", capture: section(r"\n(?:Other|Flat|Corrosion|Features)") },
    FieldRule { field: "other_mounting", label: r"(?i)Other Mounting Orientations:", capture: section(r"\n(?:Flat|Corrosion|Features)") },
    FieldRule { field: "flat_mounting_note", label: r"(?i)Flat Mounting:", capture: section(r"\n(?:Corrosion|Unit)") },
    FieldRule { field: "corrosion_resistant", label: r"(?i)Corrosion Resistant:\s*(Yes|No)", capture: Capture::Inline },
    FieldRule { field: "unit_of_measure", label: r"(?i)Unit Of Measure:", capture: tail(r"\n(?:Technical|Features)") },
    FieldRule { field: "features", label: r"(?i)Features\n", capture: section(r"\nTechnical Drawing") },
    FieldRule { field: "main_material", label: r"(?i)Main Material[:\s]+", capture: section(r"\n(?:Ball|Retainer|Finish)") },
    FieldRule { field: "ball_material", label: r"(?i)Ball Material[:\s]+", capture: section(r"\n(?:Retainer|Finish)") },
    FieldRule { field: "retainer_material", label: r"(?i)Retainer Material[:\s]+", capture: section(r"\nFinish") },
    FieldRule { field: "finish", label: r"(?i)Finish[:\s]+", capture: section(r"\n(?:Fixing|Additional)") },
    FieldRule { field: "fixing", label: r"(?i)Fixing\n", capture: section(r"\nNotes") },
    FieldRule { field: "notes", label: r"(?i)Notes\n", capture: section(r"\n(?:Recommended Accessories|End)") },
    FieldRule { field: "accessories", label: r"(?i)Recommended Accessories\n", capture: section(r"\n(?:Spare Parts|End)") },
    FieldRule { field: "spare_parts", label: r"(?i)Spare Parts\n", capture: tail(NEVER) },
];

pub const FR_RULES: &[FieldRule] = &[
    FieldRule { field: "load_rating", label: r"(?i)Charge[:\s]+jusqu’à ([\d.,]+\s?kg)", capture: Capture::Inline },
    FieldRule { field: "slide_extension", label: r"(?i)Course[:\s]+(\d+\s?%)", capture: Capture::Inline },
    FieldRule { field: "slide_height", label: r"(?i)Hauteur de glissière[:\s]+([\d.,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "slide_thickness", label: r"(?i)Épaisseur de glissière[:\s]+([\d.,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "max_slide_length", label: r"(?i)Longueur max\. de glissière[:\s]+([\d.,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "temperature_range", label: r"(?i)Température d’utilisation[:\s]+(-?\d+ °C à \+?\d+ °C)", capture: Capture::Inline },
    FieldRule { field: "permitted_mounting", label: r"(?i)Montage autorisé:", capture: section(r"\nMontage à plat") },
    FieldRule { field: "other_mounting", label: r"(?i)Montage à plat[:\s]*", capture: section(r"\nFonctions") },
    FieldRule { field: "features", label: r"(?i)Fonctions\n", capture: section(r"\nDessin Technique") },
    FieldRule { field: "main_material", label: r"(?i)Matériau principal[:\s]+", capture: section(r"\n(?:Matériau des billes|Finish)") },
    FieldRule { field: "ball_material", label: r"(?i)Matériau des billes[:\s]+", capture: section(r"\n(?:Matériau du support|Finish)") },
    FieldRule { field: "retainer_material", label: r"(?i)Matériau du support[:\s]+", capture: section(r"\nFinish") },
    FieldRule { field: "finish", label: r"(?i)Finish[:\s]+", capture: section(r"\nFixation") },
    FieldRule { field: "fixing", label: r"(?i)Fixation\n", capture: section(r"\nNotes") },
    FieldRule { field: "notes", label: r"(?i)Notes\n", capture: section(r"\n(?:Accessoires Recommandés|Fin)") },
    FieldRule { field: "accessories", label: r"(?i)Accessoires Recommandés\n", capture: section(r"\n(?:Pièces de Rechange|Fin)") },
    FieldRule { field: "spare_parts", label: r"(?i)Pièces de Rechange\n", capture: tail(NEVER) },
];

pub const DE_RULES: &[FieldRule] = &[
    FieldRule { field: "load_rating", label: r"(?i)Lastwert[:\s]+bis ([\d.,]+ kg)", capture: Capture::Inline },
    FieldRule { field: "slide_extension", label: r"(?i)Auszug der Schiene[:\s]+(\d+ %)", capture: Capture::Inline },
    FieldRule { field: "slide_height", label: r"(?i)Schienenhöhe[:\s]+([\d.,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "slide_thickness", label: r"(?i)Schienendicke[:\s]+([\d.,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "max_slide_length", label: r"(?i)Maximale Schienenlänge[:\s]+([\d.,]+ mm)", capture: Capture::Inline },
    FieldRule { field: "temperature_range", label: r"(?i)Temperaturbereich[:\s]+(-?\d+ °C bis \+?\d+ °C)", capture: Capture::Inline },
    FieldRule { field: "permitted_mounting", label: r"(?i)Mögliche Montageweise:", capture: section(r"\n(?:Andere|Flachmontage)") },
    FieldRule { field: "other_mounting", label: r"(?i)Andere Montageweisen:", capture: section(r"\nFunktionen") },
    FieldRule { field: "features", label: r"(?i)Funktionen\n", capture: section(r"\nTechnische Zeichnung") },
    FieldRule { field: "main_material", label: r"(?i)Hauptmaterial[:\s]+", capture: section(r"\n(?:Kugelmaterial|Kugelkäfigmaterial)") },
    FieldRule { field: "ball_material", label: r"(?i)Kugelmaterial[:\s]+", capture: section(r"\nKugelkäfigmaterial") },
    FieldRule { field: "retainer_material", label: r"(?i)Kugelkäfigmaterial[:\s]+", capture: section(r"\nOberflächenbeschichtung") },
    FieldRule { field: "finish", label: r"(?i)Oberflächenbeschichtung[:\s]+", capture: section(r"\nBefestigung") },
    FieldRule { field: "fixing", label: r"(?i)Befestigung\n", capture: section(r"\nHinweise") },
    FieldRule { field: "notes", label: r"(?i)Hinweise\n", capture: section(r"\nEmpfohlenes Zubehör") },
    FieldRule { field: "accessories", label: r"(?i)Empfohlenes Zubehör\n", capture: section(r"\nErsatzteile") },
    FieldRule { field: "spare_parts", label: r"(?i)Ersatzteile\n", capture: tail(NEVER) },
];

// ── Segmenter vocabulary ──

/// Keyword vocabularies are tuned to the vendor's slide datasheets; substring
/// match on the lowercased line. Lines scoring zero (or tied) default to
/// English.
pub const EN_VOCAB: &[&str] = &[
    "load", "slide", "mounting", "temperature", "features", "corrosion",
    "stainless", "fixing", "accessories", "spare", "notes", "steel",
];

pub const FR_VOCAB: &[&str] = &[
    "charge", "course", "glissière", "température", "épaisseur", "longueur",
    "autorisé", "plat", "fonctions", "matériau", "billes", "acier", "zingué",
    "rechange", "dessin", "fixation",
];

pub const DE_VOCAB: &[&str] = &[
    "lastwert", "auszug", "schiene", "temperatur", "funktionen", "edelstahl",
    "befestigung", "montageweise", "hinweise", "zubehör", "ersatzteile",
    "oberfläche", "kugel", "hauptmaterial", "stahl", "technische",
];

/// Table-header abbreviations that always belong to the shared block.
pub const SHARED_TOKENS: &[&str] = &["SL", "TR", "A", "B", "C", "D", "W", "L", "L1", "mm", "kg"];

#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    pub vocabularies: Vec<(&'static str, Vec<&'static str>)>,
    pub shared_tokens: Vec<&'static str>,
    /// A language survives only with at least this many lines of more than
    /// two words.
    pub min_content_lines: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        SegmenterConfig {
            vocabularies: vec![
                ("en", EN_VOCAB.to_vec()),
                ("fr", FR_VOCAB.to_vec()),
                ("de", DE_VOCAB.to_vec()),
            ],
            shared_tokens: SHARED_TOKENS.to_vec(),
            min_content_lines: 10,
        }
    }
}

// ── Compiled rule set ──

pub struct CompiledRule {
    pub field: &'static str,
    pub label: Regex,
    pub capture: CompiledCapture,
}

pub enum CompiledCapture {
    Inline,
    Section { terminator: Regex, open_ended: bool },
}

pub struct LanguageRules {
    pub language: &'static str,
    pub rules: Vec<CompiledRule>,
}

/// Immutable pattern configuration for one pipeline run; compiled once and
/// passed into every stage rather than read from ambient statics, so tests
/// can substitute vocabularies without touching extraction logic.
pub struct RuleSet {
    pub segmenter: SegmenterConfig,
    pub sku_token: Regex,
    languages: Vec<LanguageRules>,
}

impl RuleSet {
    /// The production tables for this vendor's EN/FR/DE datasheets.
    pub fn standard() -> Self {
        RuleSet::new(
            SegmenterConfig::default(),
            &[("en", EN_RULES), ("fr", FR_RULES), ("de", DE_RULES)],
            r"\b(?:DB|DS|DZ)\d+[A-Z0-9-]*",
        )
    }

    pub fn new(
        segmenter: SegmenterConfig,
        tables: &[(&'static str, &[FieldRule])],
        sku_token: &str,
    ) -> Self {
        let languages = tables
            .iter()
            .map(|(lang, rules)| LanguageRules {
                language: lang,
                rules: rules.iter().map(compile_rule).collect(),
            })
            .collect();
        RuleSet {
            segmenter,
            sku_token: Regex::new(sku_token).unwrap(),
            languages,
        }
    }

    pub fn with_min_content_lines(mut self, min: usize) -> Self {
        self.segmenter.min_content_lines = min;
        self
    }

    pub fn language(&self, tag: &str) -> Option<&LanguageRules> {
        self.languages.iter().find(|l| l.language == tag)
    }
}

fn compile_rule(rule: &FieldRule) -> CompiledRule {
    CompiledRule {
        field: rule.field,
        label: Regex::new(rule.label).unwrap(),
        capture: match rule.capture {
            Capture::Inline => CompiledCapture::Inline,
            Capture::Section {
                terminator,
                open_ended,
            } => CompiledCapture::Section {
                terminator: Regex::new(terminator).unwrap(),
                open_ended,
            },
        },
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_tables_compile() {
        let rules = RuleSet::standard();
        for lang in ["en", "fr", "de"] {
            let table = rules.language(lang).unwrap();
            assert!(table.rules.len() >= 17, "{lang} table too small");
        }
        assert!(rules.language("es").is_none());
    }

    #[test]
    fn every_rule_names_a_known_field() {
        for table in [EN_RULES, FR_RULES, DE_RULES] {
            for rule in table {
                assert!(
                    crate::record::FIELD_NAMES.contains(&rule.field),
                    "unknown field {}",
                    rule.field
                );
            }
        }
    }
}
