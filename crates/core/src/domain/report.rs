use crate::analytics::profile::FinancialType;
use crate::domain::recommendation::Recommendation;
use crate::domain::transaction::{Category, Segment, TransactionRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub user_id: i64,
    pub segment: Segment,
    pub period: Period,
    pub profile: ProfileView,
    pub activity: Activity,
    pub categories: CategoriesView,
    pub recommendations: Vec<Recommendation>,
    pub insights: Vec<String>,
    pub advice: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileView {
    pub salary_monthly: i64,
    pub spent_3m: i64,
    pub spent_monthly: i64,
    pub spent_ratio: f64,
    pub balance_left_3m: i64,
    pub balance_left_monthly: i64,
    pub financial_type: FinancialType,
    /// Display label of `financial_type`.
    pub financial_type_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub transactions_count: usize,
    pub avg_ticket: i64,
    pub tx_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoriesView {
    pub breakdown: Vec<CategoryShare>,
    pub top3: Vec<CategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: Category,
    pub amount: i64,
    pub share: f64,
}

/// Trailing-window totals without any product matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub user_id: i64,
    pub period: Period,
    pub currency: String,
    pub salary_monthly: i64,
    pub salary_3m: i64,
    pub total_spent_3m: i64,
    pub balance_left_3m: i64,
    pub categories: Vec<CategoryShare>,
}

/// Raw history of one user, optionally narrowed to a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerStatement {
    pub user_id: i64,
    pub salary: i64,
    pub balance_left: i64,
    pub total_spent: i64,
    pub transactions_count: usize,
    pub transactions: Vec<TransactionRecord>,
}
