/// Groups digits with spaces: 1234567 -> "1 234 567".
pub fn group_digits(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Tenge amount for display: "1 234 567 ₸".
pub fn kzt(value: i64) -> String {
    format!("{} ₸", group_digits(value))
}

/// Whole tenge of a computed amount, fraction dropped.
///
/// Rounds to the minor unit first so `0.7 * 350_000.0` yields 245 000, not 244 999.
pub fn whole_tenge(value: f64) -> i64 {
    ((value * 100.0).round_ties_even() / 100.0) as i64
}

/// Whole percent of a ratio, e.g. 0.873 -> 87. Halves go to the even neighbour.
pub fn percent(ratio: f64) -> i64 {
    (ratio * 100.0).round_ties_even() as i64
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kzt_formatting() {
        assert_eq!(kzt(1_234_567), "1 234 567 ₸");
        assert_eq!(kzt(300_000), "300 000 ₸");
        assert_eq!(kzt(999), "999 ₸");
        assert_eq!(kzt(0), "0 ₸");
        assert_eq!(kzt(-45_000), "-45 000 ₸");
    }

    #[test]
    fn percent_and_rounding() {
        assert_eq!(percent(0.873), 87);
        assert_eq!(percent(1.2), 120);
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
        // 150k over the window on a 400k salary: exactly 12.5%.
        assert_eq!(percent(150_000.0 / 1_200_000.0), 12);
        assert_eq!(percent(0.135), 14);
    }

    #[test]
    fn whole_tenge_ignores_float_noise() {
        assert_eq!(whole_tenge(350_000.0 * 0.7), 245_000);
        assert_eq!(whole_tenge(400_000.0 * 0.1), 40_000);
        assert_eq!(whole_tenge(1_000_000.0 / 3.0), 333_333);
        assert_eq!(whole_tenge(0.0), 0);
    }
}
