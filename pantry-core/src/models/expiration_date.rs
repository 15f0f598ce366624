use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::time::{self, DAY_MS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpirationType {
    /// Quality degrades after the date; still safe to eat.
    BestBefore,
    /// Must not be eaten after the date.
    UseBy,
}

impl fmt::Display for ExpirationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpirationType::BestBefore => write!(f, "BEST_BEFORE"),
            ExpirationType::UseBy => write!(f, "USE_BY"),
        }
    }
}

impl FromStr for ExpirationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "BEST_BEFORE" => Ok(ExpirationType::BestBefore),
            "USE_BY" => Ok(ExpirationType::UseBy),
            _ => Err(format!(
                "Invalid expiration type '{}'. Valid options: best_before, use_by",
                s
            )),
        }
    }
}

/// The date a pantry item expires, and what kind of date it is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpirationDate {
    date: DateTime<Utc>,
    expiration_type: ExpirationType,
}

impl ExpirationDate {
    /// Dates outside years 1 to 9999 are pulled to the nearest end of that range.
    pub fn new(date: DateTime<Utc>, expiration_type: ExpirationType) -> Self {
        Self {
            date: time::clamp(date.trunc_subsecs(3)),
            expiration_type,
        }
    }

    pub fn best_before(date: DateTime<Utc>) -> Self {
        Self::new(date, ExpirationType::BestBefore)
    }

    pub fn use_by(date: DateTime<Utc>) -> Self {
        Self::new(date, ExpirationType::UseBy)
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn expiration_type(&self) -> ExpirationType {
        self.expiration_type
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(time::now())
    }

    pub fn is_expired_at(&self, reference: DateTime<Utc>) -> bool {
        self.date < reference
    }

    pub fn days_until_expiration(&self) -> i64 {
        self.days_until_expiration_at(time::now())
    }

    /// Whole days left, rounded up; negative once expired by a full day.
    pub fn days_until_expiration_at(&self, reference: DateTime<Utc>) -> i64 {
        let ms = (self.date - reference).num_milliseconds();
        (ms as f64 / DAY_MS as f64).ceil() as i64
    }

    pub fn is_expiring_soon(&self, threshold_days: i64) -> bool {
        self.is_expiring_soon_at(threshold_days, time::now())
    }

    pub fn is_expiring_soon_at(&self, threshold_days: i64, reference: DateTime<Utc>) -> bool {
        let days = self.days_until_expiration_at(reference);
        (0..=threshold_days).contains(&days)
    }

    pub fn is_safety_critical(&self) -> bool {
        self.expiration_type == ExpirationType::UseBy
    }
}

impl fmt::Display for ExpirationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.expiration_type {
            ExpirationType::BestBefore => "best before",
            ExpirationType::UseBy => "use by",
        };
        write!(f, "{} {}", label, self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_until_expiration_rounds_up() {
        let now = reference();
        let exp = ExpirationDate::best_before(now + Duration::hours(25));
        assert_eq!(exp.days_until_expiration_at(now), 2);

        let exp = ExpirationDate::best_before(now + Duration::days(3));
        assert_eq!(exp.days_until_expiration_at(now), 3);

        let exp = ExpirationDate::best_before(now - Duration::days(1));
        assert_eq!(exp.days_until_expiration_at(now), -1);
    }

    #[test]
    fn test_is_expired() {
        let now = reference();
        assert!(ExpirationDate::use_by(now - Duration::seconds(1)).is_expired_at(now));
        assert!(!ExpirationDate::use_by(now).is_expired_at(now));
        assert!(!ExpirationDate::use_by(now + Duration::days(1)).is_expired_at(now));
    }

    #[test]
    fn test_is_expiring_soon_window() {
        let now = reference();
        let in_three = ExpirationDate::best_before(now + Duration::days(3));
        let in_four = ExpirationDate::best_before(now + Duration::days(4));
        let yesterday = ExpirationDate::best_before(now - Duration::days(1));

        assert!(in_three.is_expiring_soon_at(3, now));
        assert!(!in_four.is_expiring_soon_at(3, now));
        assert!(!yesterday.is_expiring_soon_at(3, now));
        assert!(ExpirationDate::best_before(now).is_expiring_soon_at(0, now));
    }

    #[test]
    fn test_safety_critical_only_for_use_by() {
        let now = reference();
        assert!(ExpirationDate::use_by(now).is_safety_critical());
        assert!(!ExpirationDate::best_before(now).is_safety_critical());
    }

    #[test]
    fn test_expiration_type_from_str() {
        assert_eq!(
            ExpirationType::from_str("use_by").unwrap(),
            ExpirationType::UseBy
        );
        assert_eq!(
            ExpirationType::from_str("BEST-BEFORE").unwrap(),
            ExpirationType::BestBefore
        );
        assert!(ExpirationType::from_str("sell_by").is_err());
    }

    #[test]
    fn test_display() {
        let exp = ExpirationDate::use_by(reference());
        assert_eq!(format!("{}", exp), "use by 2025-03-10");
    }
}
