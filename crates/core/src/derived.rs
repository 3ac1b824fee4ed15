//! Display-only values computed from records: ages and farm totals.

use crate::record::{Bird, Chick, Pair};
use crate::vocab::Sex;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;

/// Parse a stored date. Accepts `YYYY-MM-DD` (optionally followed by a time
/// part, as in `2024-01-15T08:00:00`) and `DD/MM/YYYY`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    if let Some(date) = value
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
    {
        return Some(date);
    }
    NaiveDate::parse_from_str(value, "%d/%m/%Y").ok()
}

/// Whole months between `born` and `today`.
///
/// Counts calendar months, then takes one off if today's day of the month
/// is before the birth day. Never negative.
pub fn months_between(born: NaiveDate, today: NaiveDate) -> u32 {
    let mut months = (today.year() - born.year()) * 12 + today.month() as i32 - born.month() as i32;
    if today.day() < born.day() {
        months -= 1;
    }
    u32::try_from(months).unwrap_or(0)
}

/// Age in months of a stored birth or hatch date, `None` when the date is
/// blank or unreadable.
pub fn age_in_months(date: &str, today: NaiveDate) -> Option<u32> {
    parse_date(date).map(|born| months_between(born, today))
}

/// Age as shown in tables: a number of months, or `-`.
pub fn age_label(date: &str, today: NaiveDate) -> String {
    age_in_months(date, today).map_or_else(|| "-".to_string(), |m| m.to_string())
}

/// Headline numbers for the statistics view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FarmStats {
    pub total_birds: usize,
    pub male_birds: usize,
    pub female_birds: usize,
    /// Distinct non-blank species names.
    pub species: usize,
    pub total_pairs: usize,
    pub active_pairs: usize,
    pub total_chicks: usize,
    /// Chicks not recorded as deceased.
    pub live_chicks: usize,
}

impl FarmStats {
    /// Sex is matched by substring, so values like `ผู้ (DNA)` still count.
    pub fn compute(birds: &[Bird], pairs: &[Pair], chicks: &[Chick]) -> Self {
        let male = Sex::Male.as_str();
        let female = Sex::Female.as_str();

        let species: HashSet<&str> = birds
            .iter()
            .map(|b| b.species.trim())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            total_birds: birds.len(),
            male_birds: birds.iter().filter(|b| b.sex.contains(male)).count(),
            female_birds: birds.iter().filter(|b| b.sex.contains(female)).count(),
            species: species.len(),
            total_pairs: pairs.len(),
            active_pairs: pairs.iter().filter(|p| p.is_active()).count(),
            total_chicks: chicks.len(),
            live_chicks: chicks.iter().filter(|c| c.is_alive()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date(" 2024-01-15 "), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T08:30:00"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T08:30:00.000Z"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_months_between() {
        let today = date(2026, 10, 18);
        assert_eq!(months_between(date(2026, 10, 1), today), 0);
        assert_eq!(months_between(date(2026, 9, 18), today), 1);
        assert_eq!(months_between(date(2026, 9, 19), today), 0);
        assert_eq!(months_between(date(2025, 10, 18), today), 12);
        assert_eq!(months_between(date(2024, 12, 31), today), 21);
    }

    #[test]
    fn test_future_dates_clamp_to_zero() {
        assert_eq!(months_between(date(2027, 1, 1), date(2026, 10, 18)), 0);
    }

    #[test]
    fn test_age_label() {
        let today = date(2026, 10, 18);
        assert_eq!(age_label("2026-04-18", today), "6");
        assert_eq!(age_label("", today), "-");
        assert_eq!(age_label("unknown", today), "-");
    }

    #[test]
    fn test_farm_stats() {
        let bird = |sex: &str, species: &str| Bird {
            sex: sex.to_string(),
            species: species.to_string(),
            ..Bird::default()
        };
        let birds = vec![
            bird("ผู้", "Canary"),
            bird("เมีย", "canary"),
            bird("เมีย", " Canary "),
            bird("ไม่ทราบ", ""),
        ];
        let pairs = vec![
            Pair::default(),
            Pair {
                status: "สิ้นสุด".to_string(),
                ..Pair::default()
            },
        ];
        let chick = |status: &str| Chick {
            status: status.to_string(),
            ..Chick::default()
        };
        let chicks = vec![chick("มีชีวิต"), chick("ขายแล้ว"), chick("เสียชีวิต"), chick("")];

        let stats = FarmStats::compute(&birds, &pairs, &chicks);

        assert_eq!(stats.total_birds, 4);
        assert_eq!(stats.male_birds, 1);
        assert_eq!(stats.female_birds, 2);
        assert_eq!(stats.species, 2);
        assert_eq!(stats.total_pairs, 2);
        assert_eq!(stats.active_pairs, 1);
        assert_eq!(stats.total_chicks, 4);
        assert_eq!(stats.live_chicks, 3);
    }

    #[test]
    fn test_stats_on_empty_farm() {
        assert_eq!(FarmStats::compute(&[], &[], &[]), FarmStats::default());
    }
}
