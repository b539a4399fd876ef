use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar month: a year and a month with the day fixed to 1.
///
/// Ordering is chronological. The text form is `yyyy/MM/01`, which is also the header used for
/// the month's column in the rollup output.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct CanonicalMonth {
    year: i32,
    month: u32,
}

impl CanonicalMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`.
    pub fn of(date: impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The first day of this month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }
}

impl fmt::Display for CanonicalMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/01", self.year, self.month)
    }
}

impl FromStr for CanonicalMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Expected format: "2024/01/01"
        let date = NaiveDate::parse_from_str(s.trim(), "%Y/%m/%d")
            .map_err(|e| anyhow::anyhow!("Invalid month '{s}': {e}"))?;
        if date.day() != 1 {
            anyhow::bail!("A month must fall on the first day, got: {s}");
        }
        Ok(Self::of(date))
    }
}

impl Serialize for CanonicalMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CanonicalMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CanonicalMonth::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_display() {
        assert_eq!(CanonicalMonth::new(2024, 1).unwrap().to_string(), "2024/01/01");
        assert_eq!(CanonicalMonth::new(987, 12).unwrap().to_string(), "0987/12/01");
    }

    #[test]
    fn test_month_new_rejects_bad_month() {
        assert!(CanonicalMonth::new(2024, 0).is_none());
        assert!(CanonicalMonth::new(2024, 13).is_none());
    }

    #[test]
    fn test_month_of_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let month = CanonicalMonth::of(date);
        assert_eq!(month, CanonicalMonth::new(2024, 2).unwrap());
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn test_month_from_str() {
        let month: CanonicalMonth = "2024/03/01".parse().unwrap();
        assert_eq!(month, CanonicalMonth::new(2024, 3).unwrap());
        assert!("2024/03/02".parse::<CanonicalMonth>().is_err());
        assert!("2024-03-01".parse::<CanonicalMonth>().is_err());
    }

    #[test]
    fn test_month_ordering_matches_text_ordering() {
        let mut months = vec![
            CanonicalMonth::new(2024, 10).unwrap(),
            CanonicalMonth::new(2023, 12).unwrap(),
            CanonicalMonth::new(2024, 2).unwrap(),
        ];
        let mut texts: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        months.sort();
        texts.sort();
        let sorted: Vec<String> = months.iter().map(|m| m.to_string()).collect();
        assert_eq!(sorted, texts);
    }

    #[test]
    fn test_month_serde() {
        let month = CanonicalMonth::new(2025, 7).unwrap();
        let json = serde_json::to_string(&month).unwrap();
        assert_eq!(json, r#""2025/07/01""#);
        let back: CanonicalMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, month);
    }
}
