//! The per-request pipeline: window, profile, decision list, insights and advice.

pub mod advice;
pub mod fmt;
pub mod insights;
pub mod profile;
pub mod window;

use crate::catalog::EngineConfig;
use crate::domain::report::{
    Activity, AnalyticsReport, CategoriesView, CategoryShare, Period, ProfileView, SpendingSummary,
};
use crate::domain::transaction::{Segment, TransactionRecord};
use crate::error::AnalyticsError;
use crate::recommend::{recommend, MatchContext, SegmentPolicy};
use chrono::NaiveDate;
use window::{CategoryAmount, WindowAggregate, WINDOW_MONTHS};

/// Validated configuration bound to both segment policies. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn policy(&self, segment: Segment) -> &dyn SegmentPolicy {
        match segment {
            Segment::Retail => &self.config.retail,
            Segment::Business => &self.config.business,
        }
    }

    pub fn analyze_retail(
        &self,
        user_id: i64,
        records: &[TransactionRecord],
        as_of_date: NaiveDate,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        self.analyze(Segment::Retail, user_id, records, as_of_date)
    }

    pub fn analyze_business(
        &self,
        user_id: i64,
        records: &[TransactionRecord],
        as_of_date: NaiveDate,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        self.analyze(Segment::Business, user_id, records, as_of_date)
    }

    /// Full report over the trailing window ending at `as_of_date`.
    ///
    /// `records` is the user's whole history in source order; the first record carries the
    /// authoritative salary.
    pub fn analyze(
        &self,
        segment: Segment,
        user_id: i64,
        records: &[TransactionRecord],
        as_of_date: NaiveDate,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        let salary = authoritative_salary(user_id, records)?;
        let agg = window_of(user_id, records, as_of_date)?;
        let policy = self.policy(segment);

        let spent_3m = agg.breakdown.raw_total;
        let profile = profile::classify(spent_3m, salary, &self.config.financial_type_bands);

        let ctx = MatchContext::new(&profile, &agg.breakdown, &agg.records);
        let recommendations = recommend(policy, &ctx);
        let insights = insights::extract(&agg.records);
        let advice = advice::narrate(&self.config.advice, policy, &profile, &agg.breakdown);

        let count = agg.transactions_count();
        let days = agg.window.days();
        let report = AnalyticsReport {
            user_id,
            segment,
            period: period_of(&agg),
            profile: ProfileView {
                salary_monthly: profile.salary_monthly,
                spent_3m,
                spent_monthly: fmt::whole_tenge(profile.spent_monthly),
                spent_ratio: fmt::round_to(profile.spent_ratio, 3),
                balance_left_3m: profile.balance_left_3m(),
                balance_left_monthly: fmt::whole_tenge(profile.free_cash_monthly),
                financial_type: profile.financial_type,
                financial_type_label: profile.financial_type.label().to_string(),
            },
            activity: Activity {
                transactions_count: count,
                avg_ticket: if count > 0 { spent_3m / count as i64 } else { 0 },
                tx_per_day: fmt::round_to(count as f64 / days.max(1) as f64, 2),
            },
            categories: CategoriesView {
                breakdown: agg.breakdown.entries.iter().map(share_view).collect(),
                top3: agg.breakdown.top_n(3).iter().map(share_view).collect(),
            },
            recommendations,
            insights,
            advice,
        };

        tracing::info!(
            user_id,
            segment = %segment,
            transactions = count,
            spent_ratio = report.profile.spent_ratio,
            recommendations = report.recommendations.len(),
            "analytics computed"
        );
        Ok(report)
    }

    /// Window totals only; no product matching.
    pub fn spending_summary(
        &self,
        user_id: i64,
        records: &[TransactionRecord],
        as_of_date: NaiveDate,
    ) -> Result<SpendingSummary, AnalyticsError> {
        let salary = authoritative_salary(user_id, records)?;
        let agg = window_of(user_id, records, as_of_date)?;
        let salary_3m = salary.saturating_mul(WINDOW_MONTHS);
        let total = agg.breakdown.total;

        Ok(SpendingSummary {
            user_id,
            period: period_of(&agg),
            currency: self.config.currency.clone(),
            salary_monthly: salary,
            salary_3m,
            total_spent_3m: total,
            balance_left_3m: salary_3m.saturating_sub(total),
            categories: agg.breakdown.entries.iter().map(share_view).collect(),
        })
    }
}

fn authoritative_salary(user_id: i64, records: &[TransactionRecord]) -> Result<i64, AnalyticsError> {
    records
        .first()
        .map(|r| r.salary)
        .ok_or(AnalyticsError::UserNotFound { user_id })
}

fn window_of(
    user_id: i64,
    records: &[TransactionRecord],
    as_of_date: NaiveDate,
) -> Result<WindowAggregate<'_>, AnalyticsError> {
    window::aggregate(records, as_of_date).map_err(|e| AnalyticsError::EmptyWindow {
        user_id,
        start: e.window.start,
        end: e.window.end,
    })
}

fn period_of(agg: &WindowAggregate<'_>) -> Period {
    Period {
        start_date: agg.window.start,
        end_date: agg.window.end,
        days: agg.window.days(),
    }
}

fn share_view(entry: &CategoryAmount) -> CategoryShare {
    CategoryShare {
        category: entry.category,
        amount: entry.amount,
        share: entry.share_bp() as f64 / 10_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::profile::FinancialType;
    use crate::analytics::window::tests::rec;
    use crate::domain::transaction::Category;
    use crate::error::ErrorKind;

    fn engine() -> Engine {
        Engine::new(EngineConfig::builtin().unwrap()).unwrap()
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn history() -> Vec<TransactionRecord> {
        vec![
            rec(Some("2025-05-05"), "Кофе и рестораны", 50_000),
            rec(Some("2025-05-06"), "Продукты питания", 600_000),
            rec(None, "Продукты питания", 999),
            rec(Some("2025-06-01"), "Путешествия", 400_000),
            rec(Some("2025-01-01"), "Такси", 77_000),
        ]
    }

    #[test]
    fn retail_report_matches_hand_computed_figures() {
        let report = engine().analyze_retail(7, &history(), as_of()).unwrap();

        assert_eq!(report.segment, Segment::Retail);
        assert_eq!(
            report.period,
            Period {
                start_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                end_date: as_of(),
                days: 90,
            }
        );

        let p = &report.profile;
        assert_eq!(p.salary_monthly, 500_000);
        assert_eq!(p.spent_3m, 1_050_000);
        assert_eq!(p.spent_monthly, 350_000);
        assert_eq!(p.spent_ratio, 0.7);
        assert_eq!(p.balance_left_3m, 450_000);
        assert_eq!(p.balance_left_monthly, 150_000);
        assert_eq!(p.financial_type, FinancialType::Economical);
        assert_eq!(p.financial_type_label, "Экономный");

        assert_eq!(report.activity.transactions_count, 3);
        assert_eq!(report.activity.avg_ticket, 350_000);
        assert_eq!(report.activity.tx_per_day, 0.03);

        assert_eq!(report.categories.breakdown.len(), 11);
        let top3: Vec<(Category, f64)> = report
            .categories
            .top3
            .iter()
            .map(|c| (c.category, c.share))
            .collect();
        assert_eq!(
            top3,
            vec![
                (Category::Groceries, 0.5714),
                (Category::Travel, 0.381),
                (Category::CafesAndRestaurants, 0.0476),
            ]
        );

        let names: Vec<&str> = report
            .recommendations
            .iter()
            .map(|r| r.product_name.as_str())
            .collect();
        assert_eq!(names, vec!["Копилка", "Вакала"]);

        assert_eq!(
            report.insights,
            vec![
                "Средний чек в «Кофе и рестораны»: 50 000 ₸".to_string(),
                "Самый затратный день недели: Вторник (средний чек 600 000 ₸)".to_string(),
                "Топ-категория: Продукты питания — 57.1% всех трат.".to_string(),
                "Макс. транзакция: 600 000 ₸ — Продукты питания — 2025-05-06".to_string(),
            ]
        );
        assert!(report.advice.contains("70%"), "{}", report.advice);
    }

    #[test]
    fn business_volume_selects_tier_m() {
        let records: Vec<TransactionRecord> = (0..150)
            .map(|i| rec(Some(&format!("2025-06-{:02}", 1 + i % 28)), "Такси", 1_000))
            .collect();
        let report = engine().analyze_business(7, &records, as_of()).unwrap();
        let tariff = report.recommendations.last().unwrap();
        assert_eq!(tariff.product_name, "Тарифные пакеты РКО");
        assert!(tariff.reason.contains("Пакет M"));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.product_name == "Бизнес-карта"));
    }

    #[test]
    fn empty_ledger_is_not_found() {
        let err = engine().analyze_retail(42, &[], as_of()).unwrap_err();
        assert!(matches!(err, AnalyticsError::UserNotFound { user_id: 42 }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn quiet_user_reports_empty_window() {
        let records = vec![rec(Some("2024-01-01"), "Кино", 1_000)];
        let err = engine().analyze_business(7, &records, as_of()).unwrap_err();
        match err {
            AnalyticsError::EmptyWindow { user_id, start, end } => {
                assert_eq!(user_id, 7);
                assert_eq!(start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
                assert_eq!(end, as_of());
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn spending_summary_uses_categorised_total() {
        let mut records = history();
        records.push(rec(Some("2025-06-10"), "Аптека", 10_000));
        let s = engine().spending_summary(7, &records, as_of()).unwrap();
        assert_eq!(s.currency, "KZT");
        assert_eq!(s.salary_3m, 1_500_000);
        assert_eq!(s.total_spent_3m, 1_050_000);
        assert_eq!(s.balance_left_3m, 450_000);
        assert_eq!(s.categories.len(), 11);
        let sum: f64 = s.categories.iter().map(|c| c.share).sum();
        assert!((sum - 1.0).abs() < 1e-3);
    }

    #[test]
    fn reports_are_deterministic() {
        let e = engine();
        let a = e.analyze_retail(7, &history(), as_of()).unwrap();
        let b = e.analyze_retail(7, &history(), as_of()).unwrap();
        assert_eq!(a, b);
    }
}
