use crate::analytics::window::WINDOW_MONTHS;
use crate::catalog::ensure_ratio;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinancialType {
    Economical,
    Balanced,
    SpendsAll,
    Overdrawn,
}

impl FinancialType {
    pub fn label(self) -> &'static str {
        match self {
            FinancialType::Economical => "Экономный",
            FinancialType::Balanced => "Сбалансированный",
            FinancialType::SpendsAll => "Тратит всё",
            FinancialType::Overdrawn => "В минусе",
        }
    }
}

/// Upper bounds (inclusive) of the spend-ratio bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialTypeBands {
    pub economical_max: f64,
    pub balanced_max: f64,
    pub spends_all_max: f64,
}

impl Default for FinancialTypeBands {
    fn default() -> Self {
        Self {
            economical_max: 0.70,
            balanced_max: 0.85,
            spends_all_max: 1.00,
        }
    }
}

impl FinancialTypeBands {
    pub fn classify(&self, spent_ratio: f64) -> FinancialType {
        if spent_ratio <= self.economical_max {
            FinancialType::Economical
        } else if spent_ratio <= self.balanced_max {
            FinancialType::Balanced
        } else if spent_ratio <= self.spends_all_max {
            FinancialType::SpendsAll
        } else {
            FinancialType::Overdrawn
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure_ratio("economical_max", self.economical_max)?;
        ensure_ratio("balanced_max", self.balanced_max)?;
        ensure_ratio("spends_all_max", self.spends_all_max)?;
        ensure!(
            self.economical_max < self.balanced_max && self.balanced_max < self.spends_all_max,
            "bands must be strictly increasing"
        );
        Ok(())
    }
}

/// Salary-normalised view of one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialProfile {
    pub salary_monthly: i64,
    pub spent_3m: i64,
    pub spent_monthly: f64,
    pub spent_ratio: f64,
    pub free_cash_monthly: f64,
    pub financial_type: FinancialType,
}

impl FinancialProfile {
    pub fn salary_3m(&self) -> i64 {
        self.salary_monthly.saturating_mul(WINDOW_MONTHS)
    }

    /// Income minus spend over the window; negative when overspent.
    pub fn balance_left_3m(&self) -> i64 {
        self.salary_3m().saturating_sub(self.spent_3m)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.salary_monthly >= 0, "salary_monthly must be >= 0");
        ensure!(self.spent_3m >= 0, "spent_3m must be >= 0");
        ensure_ratio("spent_ratio", self.spent_ratio)?;
        ensure_ratio("spent_monthly", self.spent_monthly)?;
        ensure_ratio("free_cash_monthly", self.free_cash_monthly)?;
        Ok(())
    }
}

pub fn classify(spent_3m: i64, salary_monthly: i64, bands: &FinancialTypeBands) -> FinancialProfile {
    let months = WINDOW_MONTHS as f64;
    let salary_3m = salary_monthly.saturating_mul(WINDOW_MONTHS);
    let spent_ratio = if salary_3m > 0 {
        spent_3m as f64 / salary_3m as f64
    } else {
        0.0
    };
    let free_cash_monthly = (salary_3m.saturating_sub(spent_3m) as f64 / months).max(0.0);

    FinancialProfile {
        salary_monthly,
        spent_3m,
        spent_monthly: spent_3m as f64 / months,
        spent_ratio,
        free_cash_monthly,
        financial_type: bands.classify(spent_ratio),
    }
}
