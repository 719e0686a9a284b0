//! Free-text advice keyed on the spend ratio.
//!
//! Advice bands are their own table, separate from [`FinancialTypeBands`], with lower bounds
//! inclusive (the financial-type bands are inclusive at the upper edge).
//!
//! [`FinancialTypeBands`]: crate::analytics::profile::FinancialTypeBands

use crate::analytics::fmt::{percent, whole_tenge};
use crate::analytics::profile::FinancialProfile;
use crate::analytics::window::CategoryBreakdown;
use crate::catalog::ensure_ratio;
use crate::domain::transaction::Category;
use crate::recommend::SegmentPolicy;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceBand {
    /// ratio >= strained_from
    Strained,
    /// on_edge_from <= ratio < strained_from
    OnEdge,
    /// balanced_from <= ratio < on_edge_from
    Balanced,
    /// ratio < balanced_from
    Comfortable,
}

/// Lower bounds (inclusive) of each band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdviceBands {
    pub strained_from: f64,
    pub on_edge_from: f64,
    pub balanced_from: f64,
}

impl Default for AdviceBands {
    fn default() -> Self {
        Self {
            strained_from: 0.95,
            on_edge_from: 0.85,
            balanced_from: 0.70,
        }
    }
}

impl AdviceBands {
    pub fn band(&self, spent_ratio: f64) -> AdviceBand {
        if spent_ratio >= self.strained_from {
            AdviceBand::Strained
        } else if spent_ratio >= self.on_edge_from {
            AdviceBand::OnEdge
        } else if spent_ratio >= self.balanced_from {
            AdviceBand::Balanced
        } else {
            AdviceBand::Comfortable
        }
    }
}

/// `clamp(base * fraction, min, max)` in whole tenge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClampedAmount {
    pub fraction: f64,
    pub min: i64,
    pub max: i64,
}

impl ClampedAmount {
    pub fn of(&self, base: f64) -> i64 {
        whole_tenge(base * self.fraction).max(self.min).min(self.max)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure_ratio("fraction", self.fraction)?;
        ensure!(
            0 <= self.min && self.min <= self.max,
            "min {} must be within 0..=max {}",
            self.min,
            self.max
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdviceConfig {
    pub bands: AdviceBands,
    /// Share of the top category suggested as a cut.
    pub cut_fraction: f64,
    /// Monthly savings suggestion, based on salary.
    pub save: ClampedAmount,
    /// Monthly investment suggestion, based on free cash.
    pub invest: ClampedAmount,
}

impl AdviceConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let b = &self.bands;
        ensure_ratio("strained_from", b.strained_from)?;
        ensure_ratio("on_edge_from", b.on_edge_from)?;
        ensure_ratio("balanced_from", b.balanced_from)?;
        ensure!(
            b.balanced_from < b.on_edge_from && b.on_edge_from < b.strained_from,
            "advice bands must be strictly increasing"
        );
        ensure_ratio("cut_fraction", self.cut_fraction)?;
        self.save.validate()?;
        self.invest.validate()?;
        Ok(())
    }
}

/// Figures the phrase templates interpolate.
#[derive(Debug, Clone)]
pub struct AdviceContext<'a> {
    pub band: AdviceBand,
    pub spent_percent: i64,
    pub top_category: Category,
    pub cut_percent: i64,
    pub cut_amount: i64,
    pub suggest_save: i64,
    pub suggest_invest: i64,
    pub profile: &'a FinancialProfile,
    pub breakdown: &'a CategoryBreakdown,
}

impl<'a> AdviceContext<'a> {
    pub fn new(
        config: &AdviceConfig,
        profile: &'a FinancialProfile,
        breakdown: &'a CategoryBreakdown,
    ) -> Self {
        let (top_category, top_amount) = breakdown
            .top()
            .map_or((Category::Groceries, 0), |e| (e.category, e.amount));

        Self {
            band: config.bands.band(profile.spent_ratio),
            spent_percent: percent(profile.spent_ratio),
            top_category,
            cut_percent: percent(config.cut_fraction),
            cut_amount: whole_tenge(top_amount as f64 * config.cut_fraction),
            suggest_save: config.save.of(profile.salary_monthly as f64),
            suggest_invest: config.invest.of(profile.free_cash_monthly),
            profile,
            breakdown,
        }
    }
}

pub fn narrate(
    config: &AdviceConfig,
    policy: &dyn SegmentPolicy,
    profile: &FinancialProfile,
    breakdown: &CategoryBreakdown,
) -> String {
    let ctx = AdviceContext::new(config, profile, breakdown);
    match policy.advice(&ctx) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(segment = %policy.segment(), error = %err, "advice template unavailable");
            format!("Расходы ≈ {}% дохода за период.", ctx.spent_percent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_independent_from_financial_type() {
        let bands = AdviceBands::default();
        assert_eq!(bands.band(0.96), AdviceBand::Strained);
        assert_eq!(bands.band(0.95), AdviceBand::Strained);
        assert_eq!(bands.band(0.949), AdviceBand::OnEdge);
        assert_eq!(bands.band(0.85), AdviceBand::OnEdge);
        assert_eq!(bands.band(0.70), AdviceBand::Balanced);
        assert_eq!(bands.band(0.6999), AdviceBand::Comfortable);
    }

    #[test]
    fn clamped_amounts() {
        let save = ClampedAmount {
            fraction: 0.05,
            min: 10_000,
            max: 200_000,
        };
        assert_eq!(save.of(100_000.0), 10_000);
        assert_eq!(save.of(1_000_000.0), 50_000);
        assert_eq!(save.of(10_000_000.0), 200_000);
    }
}
