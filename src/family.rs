use std::sync::LazyLock;

use regex::Regex;

static BASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z]+\d+)(.*)$").unwrap());
static LENGTH_CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\d{3,4}").unwrap());
static GLUED_EC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Z]+\d+)(EC)$").unwrap());

/// Canonical family key for a SKU.
///
/// Splits the SKU into base (letters+digits) and remainder, strips
/// hyphen-introduced 3-4 digit length codes while keeping feature suffixes
/// (EC, TR, EC-D, ...), and reattaches the remainder with one leading hyphen.
/// SKUs without the expected base shape are opaque and pass through.
/// Idempotent: `normalize_family(normalize_family(x)) == normalize_family(x)`.
///
/// DB3832-0035EC-D → DB3832-EC-D
/// DZ4505-0025     → DZ4505
/// DZ4501-0040EC   → DZ4501-EC
pub fn normalize_family(sku: &str) -> String {
    let Some(caps) = BASE_RE.captures(sku) else {
        return sku.to_string();
    };
    let base = &caps[1];
    let rest = LENGTH_CODE_RE.replace_all(&caps[2], "");
    let rest = rest.trim_matches('-');
    if rest.is_empty() {
        base.to_string()
    } else {
        format!("{base}-{rest}")
    }
}

/// Repair vendor parent SKUs that carry a glued `EC` suffix (DZ4501EC →
/// DZ4501-EC). Child SKUs like DS5334-0045EC keep their shape; they are
/// collapsed by `normalize_family` instead. Also strips stray zero-width
/// characters seen in vendor exports.
pub fn fix_parent_sku(sku: &str) -> String {
    let sku = sku.trim().replace('\u{200b}', "");
    match GLUED_EC_RE.captures(&sku) {
        Some(caps) => format!("{}-{}", &caps[1], &caps[2]),
        None => sku,
    }
}

// ── Tests ──
