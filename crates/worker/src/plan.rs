use finsight_core::domain::TransactionRecord;
use std::collections::BTreeMap;

/// What an import will write, summarised for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub rows: usize,
    pub undated: usize,
    pub unknown_category: usize,
    /// Rows per user, ascending by user id.
    pub per_user: BTreeMap<i64, usize>,
    /// Users whose rows disagree on `salary`; the first row wins at read time.
    pub salary_conflicts: Vec<i64>,
}

pub fn plan(records: &[TransactionRecord]) -> ImportPlan {
    let mut per_user: BTreeMap<i64, usize> = BTreeMap::new();
    let mut first_salary: BTreeMap<i64, i64> = BTreeMap::new();
    let mut salary_conflicts = Vec::new();

    for r in records {
        *per_user.entry(r.user_id).or_default() += 1;
        let salary = *first_salary.entry(r.user_id).or_insert(r.salary);
        if salary != r.salary && !salary_conflicts.contains(&r.user_id) {
            salary_conflicts.push(r.user_id);
        }
    }
    salary_conflicts.sort_unstable();

    ImportPlan {
        rows: records.len(),
        undated: records.iter().filter(|r| r.date.is_none()).count(),
        unknown_category: records
            .iter()
            .filter(|r| r.category_kind().is_none())
            .count(),
        per_user,
        salary_conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: i64, date: Option<&str>, category: &str, salary: i64) -> TransactionRecord {
        TransactionRecord {
            user_id,
            date: date.and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            category: category.to_string(),
            amount: 1_000,
            salary,
            balance_left: 0,
        }
    }

    #[test]
    fn summarises_rows_per_user() {
        let records = vec![
            record(2, Some("2025-05-01"), "Такси", 300_000),
            record(1, None, "Кино", 500_000),
            record(2, Some("2025-05-02"), "Аптека", 310_000),
            record(2, Some("2025-05-03"), "АЗС", 300_000),
        ];
        let p = plan(&records);
        assert_eq!(p.rows, 4);
        assert_eq!(p.undated, 1);
        assert_eq!(p.unknown_category, 1);
        assert_eq!(p.per_user.into_iter().collect::<Vec<_>>(), vec![(1, 1), (2, 3)]);
        assert_eq!(p.salary_conflicts, vec![2]);
    }
}
