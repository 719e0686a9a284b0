use anyhow::ensure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(flatten)]
    pub terms: ProductTerms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductTerms {
    Financing(FinancingTerms),
    Investment(PlacementTerms),
    Deposit(PlacementTerms),
    Overdraft(OverdraftTerms),
    Card(CardTerms),
    TariffBundle(TariffTerms),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingTerms {
    pub markup_from: i64,
    pub min_sum: i64,
    pub max_sum: i64,
    pub min_term_m: u32,
    pub max_term_m: u32,
    pub min_age: u32,
    pub max_age: u32,
}

/// Savings, investment and deposit placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementTerms {
    pub expected_yield: String,
    pub min_sum: i64,
    #[serde(default)]
    pub max_sum: Option<i64>,
    pub min_term_m: u32,
    pub max_term_m: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdraftTerms {
    pub markup_from: i64,
    pub min_sum: i64,
    pub max_sum: i64,
    pub max_term_days: u32,
    pub min_age: u32,
    pub max_age: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTerms {
    pub daily_limit: i64,
    pub service_fee: i64,
    pub cashout_rule: String,
    pub cashback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffTerms {
    pub payments_per_month: String,
    pub fee_range: String,
    #[serde(default)]
    pub extras: Vec<String>,
}

impl Product {
    pub fn kind(&self) -> &'static str {
        match self.terms {
            ProductTerms::Financing(_) => "financing",
            ProductTerms::Investment(_) => "investment",
            ProductTerms::Deposit(_) => "deposit",
            ProductTerms::Overdraft(_) => "overdraft",
            ProductTerms::Card(_) => "card",
            ProductTerms::TariffBundle(_) => "tariff_bundle",
        }
    }

    pub fn as_financing(&self) -> Option<&FinancingTerms> {
        match &self.terms {
            ProductTerms::Financing(t) => Some(t),
            _ => None,
        }
    }

    /// Investment and deposit products share placement terms.
    pub fn as_placement(&self) -> Option<&PlacementTerms> {
        match &self.terms {
            ProductTerms::Investment(t) | ProductTerms::Deposit(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_overdraft(&self) -> Option<&OverdraftTerms> {
        match &self.terms {
            ProductTerms::Overdraft(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_card(&self) -> Option<&CardTerms> {
        match &self.terms {
            ProductTerms::Card(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tariff(&self) -> Option<&TariffTerms> {
        match &self.terms {
            ProductTerms::TariffBundle(t) => Some(t),
            _ => None,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.name.trim().is_empty(), "product name must be non-empty");
        match &self.terms {
            ProductTerms::Financing(t) => {
                ensure_sum_range(t.min_sum, Some(t.max_sum))?;
                ensure_term_range(t.min_term_m, t.max_term_m)?;
                ensure_age_range(t.min_age, t.max_age)?;
                ensure!(t.markup_from >= 0, "markup_from must be >= 0");
            }
            ProductTerms::Investment(t) | ProductTerms::Deposit(t) => {
                ensure_sum_range(t.min_sum, t.max_sum)?;
                ensure_term_range(t.min_term_m, t.max_term_m)?;
            }
            ProductTerms::Overdraft(t) => {
                ensure_sum_range(t.min_sum, Some(t.max_sum))?;
                ensure_age_range(t.min_age, t.max_age)?;
                ensure!(t.max_term_days > 0, "max_term_days must be > 0");
            }
            ProductTerms::Card(t) => {
                ensure!(t.daily_limit > 0, "daily_limit must be > 0");
                ensure!(t.service_fee >= 0, "service_fee must be >= 0");
            }
            ProductTerms::TariffBundle(_) => {}
        }
        Ok(())
    }
}

fn ensure_sum_range(min_sum: i64, max_sum: Option<i64>) -> anyhow::Result<()> {
    ensure!(min_sum >= 0, "min_sum must be >= 0 (got {min_sum})");
    if let Some(max_sum) = max_sum {
        ensure!(
            min_sum <= max_sum,
            "min_sum {min_sum} exceeds max_sum {max_sum}"
        );
    }
    Ok(())
}

fn ensure_term_range(min_term_m: u32, max_term_m: u32) -> anyhow::Result<()> {
    ensure!(
        min_term_m <= max_term_m,
        "min_term_m {min_term_m} exceeds max_term_m {max_term_m}"
    );
    Ok(())
}

fn ensure_age_range(min_age: u32, max_age: u32) -> anyhow::Result<()> {
    ensure!(
        min_age <= max_age,
        "min_age {min_age} exceeds max_age {max_age}"
    );
    Ok(())
}
