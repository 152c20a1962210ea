use teloxide::utils::markdown::escape;

pub mod day;
pub mod purchase;
pub mod user;

/// Russian plural of "star" for `amount`.
pub fn stars_word(amount: i64) -> &'static str {
    let n = amount.abs() % 100;
    if (11..=14).contains(&n) {
        return "звезд";
    }
    match n % 10 {
        1 => "звезда",
        2..=4 => "звезды",
        _ => "звезд",
    }
}

pub fn fmt_stars(amount: i64) -> String {
    format!("{} {}", amount, stars_word(amount))
}

pub fn fmt_percent(value: f64) -> String {
    escape(&format!("{:.1}%", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars_word() {
        assert_eq!(fmt_stars(1), "1 звезда");
        assert_eq!(fmt_stars(3), "3 звезды");
        assert_eq!(fmt_stars(5), "5 звезд");
        assert_eq!(fmt_stars(11), "11 звезд");
        assert_eq!(fmt_stars(12), "12 звезд");
        assert_eq!(fmt_stars(21), "21 звезда");
        assert_eq!(fmt_stars(104), "104 звезды");
        assert_eq!(fmt_stars(0), "0 звезд");
    }

    #[test]
    fn test_fmt_percent() {
        assert_eq!(fmt_percent(33.3333), "33\\.3%");
    }
}
