//! Versioned business parameters: product catalogs, rule thresholds and band tables.
//!
//! The shipped document is embedded at build time; `ENGINE_CONFIG_PATH` points at an override.

pub mod product;

use crate::analytics::advice::AdviceConfig;
use crate::analytics::profile::FinancialTypeBands;
use crate::recommend::business::BusinessRules;
use crate::recommend::retail::RetailRules;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub use product::{
    CardTerms, FinancingTerms, OverdraftTerms, PlacementTerms, Product, ProductTerms, TariffTerms,
};

const BUILTIN_CONFIG: &str = include_str!("../../config/engine.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub version: String,
    pub currency: String,
    pub financial_type_bands: FinancialTypeBands,
    pub advice: AdviceConfig,
    pub retail: SegmentConfig<RetailRules>,
    pub business: SegmentConfig<BusinessRules>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig<R> {
    pub catalog: Catalog,
    pub rules: R,
}

impl EngineConfig {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_CONFIG).context("embedded engine config is invalid")
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config = serde_json::from_str::<EngineConfig>(text)
            .context("engine config does not match the expected schema")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("engine config {}", path.display()))
    }

    /// Loads the override at `path` when given, otherwise the embedded default.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::builtin()?,
        };
        tracing::info!(version = %config.version, overridden = path.is_some(), "engine config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.version.trim().is_empty(), "version must be non-empty");
        self.financial_type_bands
            .validate()
            .context("financial_type_bands")?;
        self.advice.validate().context("advice")?;
        self.retail.rules.validate(&self.retail.catalog).context("retail")?;
        self.business
            .rules
            .validate(&self.business.catalog)
            .context("business")?;
        Ok(())
    }
}

/// Products of one segment keyed by stable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: BTreeMap<String, Product>,
}

/// A product resolved to the terms of its expected kind.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a, T> {
    pub name: &'a str,
    pub terms: &'a T,
}

impl Catalog {
    pub fn product(&self, id: &str) -> anyhow::Result<&Product> {
        let product = self
            .products
            .get(id)
            .with_context(|| format!("catalog has no product {id}"))?;
        product
            .validate()
            .with_context(|| format!("product {id} is malformed"))?;
        Ok(product)
    }

    pub fn financing(&self, id: &str) -> anyhow::Result<Entry<'_, FinancingTerms>> {
        let p = self.product(id)?;
        let terms = p
            .as_financing()
            .with_context(|| format!("product {id} must be financing, got {}", p.kind()))?;
        Ok(Entry {
            name: &p.name,
            terms,
        })
    }

    pub fn placement(&self, id: &str) -> anyhow::Result<Entry<'_, PlacementTerms>> {
        let p = self.product(id)?;
        let terms = p.as_placement().with_context(|| {
            format!("product {id} must be investment or deposit, got {}", p.kind())
        })?;
        Ok(Entry {
            name: &p.name,
            terms,
        })
    }

    pub fn overdraft(&self, id: &str) -> anyhow::Result<Entry<'_, OverdraftTerms>> {
        let p = self.product(id)?;
        let terms = p
            .as_overdraft()
            .with_context(|| format!("product {id} must be overdraft, got {}", p.kind()))?;
        Ok(Entry {
            name: &p.name,
            terms,
        })
    }

    pub fn card(&self, id: &str) -> anyhow::Result<Entry<'_, CardTerms>> {
        let p = self.product(id)?;
        let terms = p
            .as_card()
            .with_context(|| format!("product {id} must be card, got {}", p.kind()))?;
        Ok(Entry {
            name: &p.name,
            terms,
        })
    }

    pub fn tariff(&self, id: &str) -> anyhow::Result<Entry<'_, TariffTerms>> {
        let p = self.product(id)?;
        let terms = p
            .as_tariff()
            .with_context(|| format!("product {id} must be tariff_bundle, got {}", p.kind()))?;
        Ok(Entry {
            name: &p.name,
            terms,
        })
    }
}

pub(crate) fn ensure_ratio(name: &str, value: f64) -> anyhow::Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite non-negative number (got {value})"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_is_valid() {
        let config = EngineConfig::builtin().unwrap();
        assert_eq!(config.currency, "KZT");
        assert_eq!(config.retail.catalog.products.len(), 5);
        assert_eq!(config.business.catalog.products.len(), 7);
    }

    #[test]
    fn resolves_typed_entries() {
        let config = EngineConfig::builtin().unwrap();
        let bnpl = config.retail.catalog.financing("BNPL").unwrap();
        assert_eq!(bnpl.name, "BNPL (рассрочка)");
        assert_eq!(bnpl.terms.max_sum, 300_000);

        // Wrong kind is an error, not a silent fallback.
        assert!(config.retail.catalog.financing("SAVINGS").is_err());
        assert!(config.retail.catalog.placement("NOPE").is_err());
    }

    #[test]
    fn rejects_catalog_missing_required_product() {
        let mut value: serde_json::Value =
            serde_json::from_str(BUILTIN_CONFIG).unwrap();
        value["business"]["catalog"]["products"]
            .as_object_mut()
            .unwrap()
            .remove("BIZ_CARD");
        let err = EngineConfig::from_json(&value.to_string()).unwrap_err();
        assert!(format!("{err:#}").contains("BIZ_CARD"));
    }

    #[test]
    fn rejects_unordered_financial_type_bands() {
        let mut value: serde_json::Value =
            serde_json::from_str(BUILTIN_CONFIG).unwrap();
        value["financial_type_bands"]["balanced_max"] = serde_json::json!(0.5);
        assert!(EngineConfig::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn missing_override_file_is_an_error() {
        assert!(EngineConfig::load(Some("/definitely/not/here.json")).is_err());
    }
}
