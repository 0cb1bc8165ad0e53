use std::sync::LazyLock;

use regex::Regex;

use crate::record::VariantRow;

static HEADER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,2}$").unwrap());
static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d[\d.,-]*$").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{2,}$").unwrap());

/// Minimum column count for a run of short tokens to qualify as a header.
const MIN_HEADER_COLS: usize = 6;

/// Recover a row/column variant table from linearized text.
///
/// PDF extraction flattens tables column-header-first: a run of short
/// abbreviation tokens (SL, TR, A, B, ...) followed by one value line per
/// cell. Every full run of N values becomes one row keyed by the lower-cased
/// headers in column order. Not every datasheet has a table; no header block
/// means an empty result, not an error.
pub fn parse_variant_table(text: &str) -> Vec<VariantRow> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    scan(&lines).0
}

/// Core scan, returning the rows plus the index of the first line NOT
/// consumed by the table (== lines.len() when the table runs to the end).
pub(crate) fn scan(lines: &[&str]) -> (Vec<VariantRow>, usize) {
    let Some((header, values_start)) = find_header(lines) else {
        return (Vec::new(), 0);
    };
    let cols = header.len();

    let mut rows = Vec::new();
    let mut row: Vec<&str> = Vec::with_capacity(cols);
    let mut stop = lines.len();

    for (i, line) in lines.iter().enumerate().skip(values_start) {
        if SEPARATOR_RE.is_match(line) {
            continue;
        }
        if !(VALUE_RE.is_match(line) || *line == "-") {
            stop = i;
            break;
        }
        row.push(line);
        if row.len() == cols {
            rows.push(fold_row(&header, &row));
            row.clear();
        }
    }
    // a trailing partial row is noise from the surrounding layout

    (rows, stop)
}

/// Find the first contiguous run of at least MIN_HEADER_COLS short
/// alphanumeric tokens; returns the headers and the index after the run.
fn find_header<'a>(lines: &[&'a str]) -> Option<(Vec<&'a str>, usize)> {
    let mut i = 0;
    while i < lines.len() {
        if HEADER_TOKEN_RE.is_match(lines[i]) {
            let mut j = i + 1;
            while j < lines.len() && HEADER_TOKEN_RE.is_match(lines[j]) {
                j += 1;
            }
            if j - i >= MIN_HEADER_COLS {
                return Some((lines[i..j].to_vec(), j));
            }
            i = j;
        } else {
            i += 1;
        }
    }
    None
}

fn fold_row(header: &[&str], values: &[&str]) -> VariantRow {
    header
        .iter()
        .zip(values)
        .map(|(h, v)| (h.to_lowercase(), v.to_string()))
        .collect()
}

// ── Tests ──
