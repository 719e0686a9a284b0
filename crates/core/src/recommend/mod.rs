//! Segment-specific decision lists matching a financial profile against a catalog.
//!
//! Each segment evaluates a fixed, ordered list of threshold rules top to bottom and emits every
//! rule that fires. Any inconsistency in the catalog or the profile yields an empty list.

pub mod business;
pub mod retail;

use crate::analytics::advice::AdviceContext;
use crate::analytics::profile::FinancialProfile;
use crate::analytics::window::CategoryBreakdown;
use crate::catalog::FinancingTerms;
use crate::domain::recommendation::{Limits, Recommendation};
use crate::domain::transaction::{Segment, TransactionRecord};

/// Everything a rule may look at.
#[derive(Debug, Clone)]
pub struct MatchContext<'a> {
    pub profile: &'a FinancialProfile,
    pub breakdown: &'a CategoryBreakdown,
    pub records: &'a [&'a TransactionRecord],
    pub max_single_transaction: i64,
    pub transactions_count: usize,
}

impl<'a> MatchContext<'a> {
    pub fn new(
        profile: &'a FinancialProfile,
        breakdown: &'a CategoryBreakdown,
        records: &'a [&'a TransactionRecord],
    ) -> Self {
        Self {
            profile,
            breakdown,
            records,
            max_single_transaction: records.iter().map(|r| r.amount).max().unwrap_or(0),
            transactions_count: records.len(),
        }
    }
}

/// Catalog plus rule table of one segment.
pub trait SegmentPolicy: Send + Sync {
    fn segment(&self) -> Segment;

    /// Evaluates the decision list. Errors mean the catalog or rule table is unusable.
    fn match_products(&self, ctx: &MatchContext<'_>) -> anyhow::Result<Vec<Recommendation>>;

    fn advice(&self, ctx: &AdviceContext<'_>) -> anyhow::Result<String>;
}

pub fn recommend(policy: &dyn SegmentPolicy, ctx: &MatchContext<'_>) -> Vec<Recommendation> {
    if let Err(err) = ctx.profile.validate() {
        tracing::warn!(segment = %policy.segment(), error = %err, "malformed profile; no recommendations");
        return Vec::new();
    }

    match policy.match_products(ctx) {
        Ok(recs) => {
            tracing::debug!(segment = %policy.segment(), count = recs.len(), "recommendations matched");
            recs
        }
        Err(err) => {
            tracing::warn!(segment = %policy.segment(), error = %format!("{err:#}"), "malformed catalog; no recommendations");
            Vec::new()
        }
    }
}

pub(crate) fn financing_limits(terms: &FinancingTerms) -> Limits {
    Limits {
        min: terms.min_sum,
        max: Some(terms.max_sum),
        term_m: Some([terms.min_term_m, terms.max_term_m]),
        max_term_days: None,
    }
}
