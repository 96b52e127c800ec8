use serde::{Deserialize, Serialize};

use super::search::SkuCatalog;
use crate::types::*;
use crate::PricingResult;

/// Ordered, duplicate-free selection of SKUs under analysis.
///
/// Only the caller mutates the set; the impact engine reads it as a slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Sku>", into = "Vec<Sku>")]
pub struct AnalysisSet {
    skus: Vec<Sku>,
}

impl AnalysisSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick `names` out of the catalog, in the given order. Repeated names
    /// are kept once.
    pub fn from_catalog<S: AsRef<str>>(catalog: &SkuCatalog, names: &[S]) -> PricingResult<Self> {
        let mut set = AnalysisSet::new();
        for name in names {
            set.add(catalog.get(name.as_ref())?.clone());
        }
        Ok(set)
    }

    /// Append a SKU. Returns `false` and leaves the set unchanged when a SKU
    /// with the same name is already present.
    pub fn add(&mut self, sku: Sku) -> bool {
        if self.contains(&sku.name) {
            return false;
        }
        self.skus.push(sku);
        true
    }

    /// Returns `false` when no SKU of that name is present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.skus.len();
        self.skus.retain(|s| s.name != name);
        self.skus.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skus.iter().any(|s| s.name == name)
    }

    pub fn skus(&self) -> &[Sku] {
        &self.skus
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.skus.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.skus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }
}

impl From<Vec<Sku>> for AnalysisSet {
    fn from(skus: Vec<Sku>) -> Self {
        let mut set = AnalysisSet::new();
        for sku in skus {
            set.add(sku);
        }
        set
    }
}

impl From<AnalysisSet> for Vec<Sku> {
    fn from(set: AnalysisSet) -> Self {
        set.skus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SkuCatalog {
        SkuCatalog::new(vec![
            Sku::new("A", Ownership::Own),
            Sku::new("B", Ownership::Competitor),
            Sku::new("C", Ownership::Own),
        ])
        .unwrap()
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut set = AnalysisSet::new();
        assert!(set.add(Sku::new("A", Ownership::Own)));
        assert!(!set.add(Sku::new("A", Ownership::Competitor)));
        assert_eq!(set.len(), 1);
        assert!(set.skus()[0].is_own());
    }

    #[test]
    fn test_remove() {
        let mut set = AnalysisSet::from_catalog(&catalog(), &["A", "B"]).unwrap();
        assert!(set.remove("A"));
        assert!(!set.remove("A"));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn test_from_catalog_keeps_requested_order() {
        let set = AnalysisSet::from_catalog(&catalog(), &["C", "A", "C"]).unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["C", "A"]);
    }

    #[test]
    fn test_deserialize_drops_repeated_names() {
        let set: AnalysisSet = serde_json::from_value(serde_json::json!([
            {"name": "A", "ownership": "OWN"},
            {"name": "A", "ownership": "COMPETITOR"},
            {"name": "B"}
        ]))
        .unwrap();
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_from_catalog_unknown_name() {
        assert!(AnalysisSet::from_catalog(&catalog(), &["A", "Z"]).is_err());
    }
}
