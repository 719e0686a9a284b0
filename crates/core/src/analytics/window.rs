use crate::domain::transaction::{Category, TransactionRecord};
use chrono::{Duration, NaiveDate};
use std::fmt;

/// Length of the trailing window in calendar days.
pub const WINDOW_DAYS: i64 = 90;

/// Number of salary periods the window stands for.
pub const WINDOW_MONTHS: i64 = 3;

/// Inclusive `[start, end]` date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    pub fn trailing(as_of_date: NaiveDate) -> Self {
        Self {
            start: as_of_date - Duration::days(WINDOW_DAYS),
            end: as_of_date,
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Records dated inside the window; undated records never qualify.
    pub fn select<'a>(&self, records: &'a [TransactionRecord]) -> Vec<&'a TransactionRecord> {
        records
            .iter()
            .filter(|r| r.date.is_some_and(|d| self.contains(d)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyWindow {
    pub window: Window,
}

impl fmt::Display for EmptyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no dated transactions between {} and {}",
            self.window.start, self.window.end
        )
    }
}

impl std::error::Error for EmptyWindow {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryAmount {
    pub category: Category,
    pub amount: i64,
    pub share: f64,
}

impl CategoryAmount {
    /// Share at reporting precision (4 decimals), in basis points.
    pub fn share_bp(&self) -> i64 {
        (self.share * 10_000.0).round_ties_even() as i64
    }
}

/// Per-category sums in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub entries: Vec<CategoryAmount>,
    /// Sum over recognised categories; shares are relative to this.
    pub total: i64,
    /// Sum over every record, including unrecognised categories.
    pub raw_total: i64,
}

impl CategoryBreakdown {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut sums = [0i64; Category::ALL.len()];
        let mut raw_total = 0i64;
        for r in records {
            raw_total = raw_total.saturating_add(r.amount);
            if let Some(c) = r.category_kind() {
                sums[c.index()] = sums[c.index()].saturating_add(r.amount);
            }
        }

        let total = sums.iter().fold(0i64, |acc, &s| acc.saturating_add(s));
        let entries = Category::ALL
            .iter()
            .map(|&category| {
                let amount = sums[category.index()];
                let share = if total > 0 {
                    amount as f64 / total as f64
                } else {
                    0.0
                };
                CategoryAmount {
                    category,
                    amount,
                    share,
                }
            })
            .collect();

        Self {
            entries,
            total,
            raw_total,
        }
    }

    pub fn get(&self, category: Category) -> Option<&CategoryAmount> {
        self.entries.iter().find(|e| e.category == category)
    }

    pub fn share(&self, category: Category) -> f64 {
        self.get(category).map_or(0.0, |e| e.share)
    }

    pub fn amount(&self, category: Category) -> i64 {
        self.get(category).map_or(0, |e| e.amount)
    }

    /// Sum of the reported (rounded) shares of `categories`, in basis points.
    pub fn combined_share_bp(&self, categories: &[Category]) -> i64 {
        categories
            .iter()
            .filter_map(|&c| self.get(c))
            .map(CategoryAmount::share_bp)
            .sum()
    }

    /// Largest amount; ties resolve to the earliest category in canonical order.
    pub fn top(&self) -> Option<&CategoryAmount> {
        self.entries.iter().fold(None, |best, e| match best {
            Some(b) if b.amount >= e.amount => Some(b),
            _ => Some(e),
        })
    }

    /// `n` largest entries by amount, canonical order kept between equal amounts.
    pub fn top_n(&self, n: usize) -> Vec<CategoryAmount> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
        sorted.truncate(n);
        sorted
    }
}

/// The trailing window of one user together with its breakdown.
#[derive(Debug, Clone)]
pub struct WindowAggregate<'a> {
    pub window: Window,
    pub records: Vec<&'a TransactionRecord>,
    pub breakdown: CategoryBreakdown,
}

impl WindowAggregate<'_> {
    pub fn transactions_count(&self) -> usize {
        self.records.len()
    }
}

pub fn aggregate(
    records: &[TransactionRecord],
    as_of_date: NaiveDate,
) -> Result<WindowAggregate<'_>, EmptyWindow> {
    let window = Window::trailing(as_of_date);
    let selected = window.select(records);
    if selected.is_empty() {
        return Err(EmptyWindow { window });
    }

    let breakdown = CategoryBreakdown::from_records(selected.iter().copied());
    tracing::debug!(
        start = %window.start,
        end = %window.end,
        selected = selected.len(),
        of = records.len(),
        total = breakdown.total,
        "window aggregated"
    );

    Ok(WindowAggregate {
        window,
        records: selected,
        breakdown,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn rec(date: Option<&str>, category: &str, amount: i64) -> TransactionRecord {
        TransactionRecord {
            user_id: 7,
            date: date.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()),
            category: category.to_string(),
            amount,
            salary: 500_000,
            balance_left: 120_000,
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn window_is_ninety_calendar_days_inclusive() {
        let w = Window::trailing(as_of());
        assert_eq!(w.start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(w.days(), 90);

        let records = vec![
            rec(Some("2025-03-31"), "Такси", 1),
            rec(Some("2025-04-01"), "Такси", 10),
            rec(Some("2025-06-30"), "Такси", 100),
            rec(Some("2025-07-01"), "Такси", 1000),
        ];
        let agg = aggregate(&records, as_of()).unwrap();
        assert_eq!(agg.transactions_count(), 2);
        assert_eq!(agg.breakdown.amount(Category::Taxi), 110);
    }

    #[test]
    fn undated_records_never_enter_the_window() {
        let records = vec![
            rec(None, "Кино", 5_000),
            rec(Some("2025-05-10"), "Кино", 2_000),
        ];
        let agg = aggregate(&records, as_of()).unwrap();
        assert_eq!(agg.transactions_count(), 1);
        assert_eq!(agg.breakdown.raw_total, 2_000);
    }

    #[test]
    fn empty_window_is_reported() {
        let records = vec![rec(Some("2024-01-01"), "Кино", 10), rec(None, "Кино", 10)];
        let err = aggregate(&records, as_of()).unwrap_err();
        assert_eq!(err.window, Window::trailing(as_of()));
    }

    #[test]
    fn shares_sum_to_one_and_order_is_canonical() {
        let records = vec![
            rec(Some("2025-05-01"), "Такси", 3_333),
            rec(Some("2025-05-02"), "АЗС", 7_777),
            rec(Some("2025-05-03"), "Кофе и рестораны", 1_111),
            rec(Some("2025-05-04"), "Отели", 99_999),
        ];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(b.entries.len(), 11);
        let order: Vec<Category> = b.entries.iter().map(|e| e.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        let sum: f64 = b.entries.iter().map(|e| e.share).sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum={sum}");
    }

    #[test]
    fn zero_total_yields_zero_shares() {
        let records = vec![rec(Some("2025-05-01"), "Такси", 0)];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(b.total, 0);
        assert!(b.entries.iter().all(|e| e.share == 0.0));
    }

    #[test]
    fn unrecognised_categories_only_count_in_raw_total() {
        let records = vec![
            rec(Some("2025-05-01"), "Аптека", 4_000),
            rec(Some("2025-05-02"), "Такси", 1_000),
        ];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(b.total, 1_000);
        assert_eq!(b.raw_total, 5_000);
        assert_eq!(b.share(Category::Taxi), 1.0);
    }

    #[test]
    fn combined_share_uses_reported_precision() {
        let records = vec![
            rec(Some("2025-05-01"), "Кофе и рестораны", 14_500),
            rec(Some("2025-05-02"), "Развлечения", 14_500),
            rec(Some("2025-05-03"), "Продукты питания", 71_000),
        ];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        let leisure = [Category::CafesAndRestaurants, Category::Entertainment];
        assert_eq!(b.combined_share_bp(&leisure), 2_900);

        // 0.24996 is reported as 0.25.
        let records = vec![
            rec(Some("2025-05-01"), "Кофе и рестораны", 24_996),
            rec(Some("2025-05-02"), "Продукты питания", 75_004),
        ];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(b.combined_share_bp(&[Category::CafesAndRestaurants]), 2_500);
    }

    #[test]
    fn oversized_amounts_saturate() {
        let records = vec![
            rec(Some("2025-05-01"), "Такси", i64::MAX),
            rec(Some("2025-05-02"), "Такси", 10),
            rec(Some("2025-05-03"), "Аптека", 10),
        ];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(b.amount(Category::Taxi), i64::MAX);
        assert_eq!(b.total, i64::MAX);
        assert_eq!(b.raw_total, i64::MAX);
    }

    #[test]
    fn re_aggregation_is_identical() {
        let records = vec![
            rec(Some("2025-05-01"), "Такси", 1_234),
            rec(Some("2025-05-09"), "Кино", 4_321),
            rec(None, "Кино", 1),
        ];
        let a = aggregate(&records, as_of()).unwrap().breakdown;
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(a, b);
        for (x, y) in a.entries.iter().zip(&b.entries) {
            assert_eq!(x.share.to_bits(), y.share.to_bits());
        }
    }

    #[test]
    fn top_prefers_canonical_order_on_ties() {
        let records = vec![
            rec(Some("2025-05-01"), "Такси", 500),
            rec(Some("2025-05-02"), "АЗС", 500),
            rec(Some("2025-05-03"), "Кино", 100),
        ];
        let b = aggregate(&records, as_of()).unwrap().breakdown;
        assert_eq!(b.top().unwrap().category, Category::FuelStation);
        let top3: Vec<Category> = b.top_n(3).iter().map(|e| e.category).collect();
        assert_eq!(
            top3,
            vec![Category::FuelStation, Category::Taxi, Category::Cinema]
        );
    }
}
