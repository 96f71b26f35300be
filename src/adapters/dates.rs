use chrono::NaiveDate;

/// Source of "today" for past-date checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Today {
    /// Local calendar date at call time
    Local,
    Fixed(NaiveDate),
}

impl Today {
    pub fn date(&self) -> NaiveDate {
        match self {
            Today::Local => chrono::Local::now().date_naive(),
            Today::Fixed(date) => *date,
        }
    }
}

/// Strict `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(parse_date("2025-06-22"), NaiveDate::from_ymd_opt(2025, 6, 22));
        assert!(parse_date("2025-6-22").is_none());
        assert!(parse_date("22/06/2025").is_none());
        assert!(parse_date("2025-02-30").is_none());
    }
}
