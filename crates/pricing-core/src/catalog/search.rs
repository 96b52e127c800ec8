use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

use crate::error::PricingError;
use crate::types::*;
use crate::PricingResult;

/// Read-only market catalog, duplicate-free by SKU name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Sku>", into = "Vec<Sku>")]
pub struct SkuCatalog {
    skus: Vec<Sku>,
}

impl TryFrom<Vec<Sku>> for SkuCatalog {
    type Error = PricingError;

    fn try_from(skus: Vec<Sku>) -> Result<Self, Self::Error> {
        SkuCatalog::new(skus)
    }
}

impl From<SkuCatalog> for Vec<Sku> {
    fn from(catalog: SkuCatalog) -> Self {
        catalog.skus
    }
}

impl SkuCatalog {
    pub fn new(skus: Vec<Sku>) -> PricingResult<Self> {
        let mut seen: HashSet<&str> = HashSet::new();
        for sku in &skus {
            if sku.name.trim().is_empty() {
                return Err(PricingError::InvalidInput {
                    field: "name".into(),
                    reason: "SKU name must not be empty".into(),
                });
            }
            if !seen.insert(sku.name.as_str()) {
                return Err(PricingError::InvalidInput {
                    field: "catalog".into(),
                    reason: format!("Duplicate SKU '{}'", sku.name),
                });
            }
        }
        Ok(SkuCatalog { skus })
    }

    pub fn skus(&self) -> &[Sku] {
        &self.skus
    }

    pub fn len(&self) -> usize {
        self.skus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Sku> {
        self.skus.iter().find(|s| s.name == name)
    }

    pub fn get(&self, name: &str) -> PricingResult<&Sku> {
        self.find(name).ok_or_else(|| PricingError::UnknownSku {
            name: name.to_string(),
            context: "catalog lookup".into(),
        })
    }

    /// SKUs matching every populated field of `filter`, in catalog order.
    pub fn search(&self, filter: &SkuFilter) -> Vec<&Sku> {
        self.skus.iter().filter(|s| filter.matches(s)).collect()
    }

    /// Market aggregates over the whole catalog, summed once per load.
    pub fn totals(&self) -> MarketTotals {
        MarketTotals::from_skus(&self.skus)
    }
}

/// Catalog filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuFilter {
    /// Case-insensitive substring of the SKU name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Ownership>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
}

impl SkuFilter {
    pub fn matches(&self, sku: &Sku) -> bool {
        if let Some(q) = self.query.as_deref().filter(|q| !q.is_empty()) {
            if !sku.name.to_lowercase().contains(&q.to_lowercase()) {
                return false;
            }
        }
        if let Some(o) = self.ownership {
            if sku.ownership != o {
                return false;
            }
        }
        if let Some(c) = self.category.as_deref() {
            if sku.category != c {
                return false;
            }
        }
        if let Some(seg) = self.segment.as_deref() {
            if sku.segment != seg {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchInput {
    pub catalog: SkuCatalog,
    #[serde(default)]
    pub filter: SkuFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutput {
    pub skus: Vec<Sku>,
    pub matched: usize,
    pub catalog_size: usize,
}

pub fn search_skus(input: &SearchInput) -> PricingResult<ComputationOutput<SearchOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let skus: Vec<Sku> = input
        .catalog
        .search(&input.filter)
        .into_iter()
        .cloned()
        .collect();
    if skus.is_empty() {
        warnings.push("No SKUs match the filter".into());
    }

    let output = SearchOutput {
        matched: skus.len(),
        catalog_size: input.catalog.len(),
        skus,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Catalog Search",
        &input.filter,
        warnings,
        elapsed,
        output,
    ))
}
