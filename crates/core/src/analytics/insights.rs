use crate::analytics::fmt::{group_digits, kzt};
use crate::analytics::window::CategoryBreakdown;
use crate::domain::transaction::{Category, TransactionRecord};
use chrono::{Datelike, Weekday};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Понедельник",
        Weekday::Tue => "Вторник",
        Weekday::Wed => "Среда",
        Weekday::Thu => "Четверг",
        Weekday::Fri => "Пятница",
        Weekday::Sat => "Суббота",
        Weekday::Sun => "Воскресенье",
    }
}

/// Up to four display facts about a window, in fixed order.
pub fn extract(records: &[&TransactionRecord]) -> Vec<String> {
    let breakdown = CategoryBreakdown::from_records(records.iter().copied());
    [
        dining_average(records),
        priciest_weekday(records),
        top_category(&breakdown),
        largest_transaction(records),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn dining_average(records: &[&TransactionRecord]) -> Option<String> {
    let label = Category::DINING.label();
    let (sum, count) = records
        .iter()
        .filter(|r| r.category_kind() == Some(Category::DINING))
        .fold((0i64, 0i64), |(s, n), r| (s.saturating_add(r.amount), n + 1));

    if count == 0 {
        return Some(format!(
            "В категории «{label}» не было покупок за период."
        ));
    }
    Some(format!("Средний чек в «{label}»: {}", kzt(sum / count)))
}

fn priciest_weekday(records: &[&TransactionRecord]) -> Option<String> {
    let mut sums = [0i64; 7];
    let mut counts = [0i64; 7];
    for r in records {
        if let Some(d) = r.date {
            let i = d.weekday().num_days_from_monday() as usize;
            sums[i] = sums[i].saturating_add(r.amount);
            counts[i] += 1;
        }
    }

    let mut best: Option<(usize, f64)> = None;
    for i in 0..7 {
        if counts[i] == 0 {
            continue;
        }
        let mean = sums[i] as f64 / counts[i] as f64;
        if best.map_or(true, |(_, m)| mean > m) {
            best = Some((i, mean));
        }
    }

    let (i, mean) = best?;
    Some(format!(
        "Самый затратный день недели: {} (средний чек {})",
        weekday_name(WEEK[i]),
        kzt(mean as i64)
    ))
}

fn top_category(breakdown: &CategoryBreakdown) -> Option<String> {
    if breakdown.total <= 0 {
        return None;
    }
    let top = breakdown.top()?;
    Some(format!(
        "Топ-категория: {} — {:.1}% всех трат.",
        top.category,
        top.share_bp() as f64 / 100.0
    ))
}

fn largest_transaction(records: &[&TransactionRecord]) -> Option<String> {
    // First maximum wins, matching source order.
    let top = records.iter().fold(None::<&TransactionRecord>, |best, r| match best {
        Some(b) if b.amount >= r.amount => Some(b),
        _ => Some(*r),
    })?;
    let date = top
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "дата неизвестна".to_string());
    Some(format!(
        "Макс. транзакция: {} ₸ — {} — {}",
        group_digits(top.amount),
        top.category,
        date
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::window::tests::rec;

    #[test]
    fn emits_all_four_in_order() {
        // 2025-05-05 is a Monday, 2025-05-10 a Saturday.
        let records = vec![
            rec(Some("2025-05-05"), "Кофе и рестораны", 3_000),
            rec(Some("2025-05-05"), "Кофе и рестораны", 5_000),
            rec(Some("2025-05-10"), "Путешествия", 250_000),
            rec(Some("2025-05-06"), "Такси", 1_500),
        ];
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        let out = extract(&refs);
        assert_eq!(
            out,
            vec![
                "Средний чек в «Кофе и рестораны»: 4 000 ₸".to_string(),
                "Самый затратный день недели: Суббота (средний чек 250 000 ₸)".to_string(),
                "Топ-категория: Путешествия — 96.3% всех трат.".to_string(),
                "Макс. транзакция: 250 000 ₸ — Путешествия — 2025-05-10".to_string(),
            ]
        );
    }

    #[test]
    fn missing_dining_is_stated_explicitly() {
        let records = vec![rec(Some("2025-05-06"), "Такси", 1_500)];
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        let out = extract(&refs);
        assert_eq!(
            out[0],
            "В категории «Кофе и рестораны» не было покупок за период."
        );
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn weekday_ties_resolve_to_earlier_day() {
        // Tuesday and Thursday share the same mean.
        let records = vec![
            rec(Some("2025-05-06"), "Такси", 2_000),
            rec(Some("2025-05-08"), "Такси", 2_000),
        ];
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        assert!(priciest_weekday(&refs).unwrap().contains("Вторник"));
    }

    #[test]
    fn zero_spend_skips_top_category_only() {
        let records = vec![rec(Some("2025-05-06"), "Такси", 0)];
        let refs: Vec<&TransactionRecord> = records.iter().collect();
        let out = extract(&refs);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| !s.starts_with("Топ-категория")));
    }

    #[test]
    fn nothing_to_say_about_an_empty_slice() {
        let out = extract(&[]);
        assert_eq!(out.len(), 1);
        assert!(out[0].contains("не было покупок"));
    }
}
