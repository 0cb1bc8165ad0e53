use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::catalog::CatalogProduct;
use crate::family::normalize_family;
use crate::record::{InheritedSpecs, SpecRecord};

pub struct Parent {
    pub sku: String,
    pub specs: SpecRecord,
}

/// Parents are only products carrying their own extracted specs, indexed by
/// family key. Built once from an immutable snapshot of the catalog; all
/// resolution happens against the finished index, never against a catalog
/// that is still being mutated.
pub struct ParentIndex {
    by_family: BTreeMap<String, Parent>,
}

impl ParentIndex {
    pub fn build(products: &[CatalogProduct]) -> Self {
        let mut by_family: BTreeMap<String, Parent> = BTreeMap::new();
        for p in products {
            let Some(specs) = &p.pdf_specs else { continue };
            let family = normalize_family(&p.sku);
            let parent = Parent {
                sku: p.sku.clone(),
                specs: specs.clone(),
            };
            if let Some(prev) = by_family.insert(family.clone(), parent) {
                warn!(%family, dropped = %prev.sku, kept = %p.sku, "duplicate family key; last write wins");
            }
        }
        ParentIndex { by_family }
    }

    pub fn len(&self) -> usize {
        self.by_family.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_family.is_empty()
    }

    /// Resolve a child's parent: exact family match first, then the slower
    /// fallback where some parent's raw SKU is a dash-prefix of the child's.
    /// A product never resolves to itself.
    pub fn resolve(&self, child_sku: &str) -> Option<&Parent> {
        let family = normalize_family(child_sku);
        if let Some(parent) = self.by_family.get(&family) {
            if parent.sku == child_sku {
                return None;
            }
            return Some(parent);
        }
        self.by_family
            .values()
            .find(|p| child_sku.starts_with(&format!("{}-", p.sku)))
    }
}

/// Copy the shared spec fields from each resolved parent onto children that
/// have no extracted specs of their own. Products with `pdf_specs` are left
/// untouched, so a product never carries both. Returns how many children
/// were enriched.
pub fn propagate(products: &mut [CatalogProduct], index: &ParentIndex) -> usize {
    let mut propagated = 0;
    for prod in products.iter_mut() {
        if prod.pdf_specs.is_some() {
            continue;
        }
        let Some(parent) = index.resolve(&prod.sku) else {
            continue;
        };
        prod.inherited_specs = Some(InheritedSpecs::from_parent(&parent.specs));
        prod.parent_sku = Some(parent.sku.clone());
        debug!(child = %prod.sku, parent = %parent.sku, "propagated shared specs");
        propagated += 1;
    }
    propagated
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(sku: &str) -> SpecRecord {
        let mut s = SpecRecord::new(sku, "en");
        s.load_rating = Some("80,000 kg".into());
        s.features = Some("Hold in detent".into());
        s
    }

    fn product(sku: &str, specs: Option<SpecRecord>) -> CatalogProduct {
        CatalogProduct {
            sku: sku.to_string(),
            name: String::new(),
            description: String::new(),
            features: String::new(),
            length_mm: None,
            weight_kg: None,
            corrosion_resistant: false,
            uom: None,
            country_of_manufacture: None,
            category_id: None,
            datasheet_ref: None,
            parent_sku: None,
            pdf_specs: specs,
            inherited_specs: None,
        }
    }

    #[test]
    fn exact_family_match_propagates() {
        let mut products = vec![
            product("DB3832-0035EC-D", Some(spec("DB3832-0035EC-D"))),
            product("DB3832-0040EC-D", None),
        ];
        let index = ParentIndex::build(&products);
        assert_eq!(propagate(&mut products, &index), 1);

        let child = &products[1];
        assert_eq!(child.parent_sku.as_deref(), Some("DB3832-0035EC-D"));
        let inherited = child.inherited_specs.as_ref().unwrap();
        assert_eq!(inherited.load_rating.as_deref(), Some("80,000 kg"));
        assert_eq!(inherited.features_summary.as_deref(), Some("Hold in detent"));
    }

    #[test]
    fn prefix_fallback_when_family_differs() {
        let mut products = vec![
            product("DZ4505-0025", Some(spec("DZ4505-0025"))),
            // family "DZ4505-LH" has no exact parent
            product("DZ4505-0025-LH", None),
        ];
        let index = ParentIndex::build(&products);
        assert_eq!(propagate(&mut products, &index), 1);
        assert_eq!(products[1].parent_sku.as_deref(), Some("DZ4505-0025"));
    }

    #[test]
    fn no_parent_means_no_inherited_specs() {
        let mut products = vec![
            product("DB3832-0035EC-D", Some(spec("DB3832-0035EC-D"))),
            product("DS0330-0300", None),
        ];
        let index = ParentIndex::build(&products);
        assert_eq!(propagate(&mut products, &index), 0);
        assert!(products[1].inherited_specs.is_none());
        assert!(products[1].parent_sku.is_none());
    }

    #[test]
    fn a_product_never_resolves_to_itself() {
        let products = vec![product("DZ4505-0025", Some(spec("DZ4505-0025")))];
        let index = ParentIndex::build(&products);
        assert!(index.resolve("DZ4505-0025").is_none());
    }

    #[test]
    fn own_specs_and_inherited_specs_are_exclusive() {
        let mut products = vec![
            product("DB3832-0035EC-D", Some(spec("DB3832-0035EC-D"))),
            product("DB3832-0040EC-D", Some(spec("DB3832-0040EC-D"))),
            product("DB3832-0050EC-D", None),
        ];
        let index = ParentIndex::build(&products);
        propagate(&mut products, &index);
        for p in &products {
            assert!(
                !(p.pdf_specs.is_some() && p.inherited_specs.is_some()),
                "{} carries both spec kinds",
                p.sku
            );
        }
    }

    #[test]
    fn duplicate_family_key_keeps_last_write() {
        let products = vec![
            product("DB3832-0035EC-D", Some(spec("DB3832-0035EC-D"))),
            product("DB3832-0040EC-D", Some(spec("DB3832-0040EC-D"))),
        ];
        let index = ParentIndex::build(&products);
        assert_eq!(index.len(), 1);
        let parent = index.resolve("DB3832-0050EC-D").unwrap();
        assert_eq!(parent.sku, "DB3832-0040EC-D");
    }
}
