use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A public holiday or day off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub date: NaiveDate,
    /// Recurring holidays repeat on the same month and day every year.
    #[serde(default = "default_recurring")]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

fn default_recurring() -> bool {
    true
}

impl Holiday {
    pub fn recurring(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: 0,
            name: name.into(),
            date,
            recurring: true,
            country: None,
        }
    }

    pub fn one_off(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: 0,
            name: name.into(),
            date,
            recurring: false,
            country: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Recurring holidays match by (month, day) in any year; one-off holidays
    /// match the exact date.
    pub fn matches(&self, date: NaiveDate) -> bool {
        if self.recurring {
            self.date.month() == date.month() && self.date.day() == date.day()
        } else {
            self.date == date
        }
    }
}

/// Answers "is this a non-working day?" from a weekday rule plus a holiday
/// table. The default weekday rule is Sunday only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayCalendar {
    holidays: Vec<Holiday>,
    non_working_days: HashSet<Weekday>,
}

impl Default for HolidayCalendar {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HolidayCalendar {
    pub fn new(holidays: Vec<Holiday>) -> Self {
        Self {
            holidays,
            non_working_days: HashSet::from([Weekday::Sun]),
        }
    }

    /// Replace the weekday rule (e.g. Saturday and Sunday off)
    pub fn with_non_working_days<I>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        self.non_working_days = days.into_iter().collect();
        self
    }

    /// Add a single holiday
    pub fn add_holiday(&mut self, holiday: Holiday) {
        self.holidays.push(holiday);
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    pub fn holiday_on(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.iter().find(|holiday| holiday.matches(date))
    }

    pub fn is_non_working_day(&self, date: NaiveDate) -> bool {
        self.non_working_reason(date).is_some()
    }

    /// Why `date` is off, or `None` for a working day.
    pub fn non_working_reason(&self, date: NaiveDate) -> Option<String> {
        if self.non_working_days.contains(&date.weekday()) {
            return Some(format!("{} is a weekly day off", date.weekday()));
        }
        self.holiday_on(date)
            .map(|holiday| format!("holiday: {}", holiday.name))
    }

    /// Working days in `[start, end]`
    pub fn working_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;

        while current <= end {
            if !self.is_non_working_day(current) {
                days.push(current);
            }
            current = current + Duration::days(1);
        }
        days
    }
}

/// Cyprus national holidays for `year`.
///
/// Fixed-date holidays are recurring; the Easter-dependent ones move every
/// year and are emitted as one-off dates for `year` only.
pub fn cyprus_holidays(year: i32) -> Vec<Holiday> {
    const COUNTRY: &str = "Cyprus";
    let fixed: [(&str, u32, u32); 10] = [
        ("New Year's Day", 1, 1),
        ("Epiphany", 1, 6),
        ("Greek Independence Day", 3, 25),
        ("Cyprus National Day", 4, 1),
        ("Labour Day", 5, 1),
        ("Assumption of Mary", 8, 15),
        ("Cyprus Independence Day", 10, 1),
        ("Greek National Day (Ochi Day)", 10, 28),
        ("Christmas Day", 12, 25),
        ("Boxing Day", 12, 26),
    ];

    let mut holidays: Vec<Holiday> = fixed
        .iter()
        .filter_map(|(name, month, day)| {
            NaiveDate::from_ymd_opt(year, *month, *day)
                .map(|date| Holiday::recurring(*name, date).with_country(COUNTRY))
        })
        .collect();

    if let Some(easter) = orthodox_easter(year) {
        let moveable: [(&str, i64); 6] = [
            ("Green Monday", -48),
            ("Good Friday", -2),
            ("Easter Saturday", -1),
            ("Easter Sunday", 0),
            ("Easter Monday", 1),
            ("Orthodox Pentecost Monday", 50),
        ];
        for (name, offset) in moveable {
            holidays.push(Holiday::one_off(name, easter + Duration::days(offset)).with_country(COUNTRY));
        }
    }

    holidays.sort_by_key(|holiday| holiday.date);
    holidays
}

/// Helper: Orthodox Easter Sunday (Gregorian date), valid for 1900..=2099
/// where the Julian/Gregorian offset is 13 days.
pub fn orthodox_easter(year: i32) -> Option<NaiveDate> {
    if !(1900..=2099).contains(&year) {
        return None;
    }
    let a = year % 4;
    let b = year % 7;
    let c = year % 19;
    let d = (19 * c + 15) % 30;
    let e = (2 * a + 4 * b - d + 34) % 7;
    let month = (d + e + 114) / 31;
    let day = (d + e + 114) % 31 + 1;
    let julian = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
    Some(julian + Duration::days(13))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn orthodox_easter_known_years() {
        assert_eq!(orthodox_easter(2024), Some(d(2024, 5, 5)));
        assert_eq!(orthodox_easter(2025), Some(d(2025, 4, 20)));
        assert_eq!(orthodox_easter(2026), Some(d(2026, 4, 12)));
        assert_eq!(orthodox_easter(1850), None);
    }

    #[test]
    fn cyprus_moveable_feasts_follow_easter() {
        let holidays = cyprus_holidays(2025);
        let find = |name: &str| {
            holidays
                .iter()
                .find(|h| h.name == name)
                .map(|h| (h.date, h.recurring))
        };
        assert_eq!(find("Green Monday"), Some((d(2025, 3, 3), false)));
        assert_eq!(find("Good Friday"), Some((d(2025, 4, 18), false)));
        assert_eq!(find("Orthodox Pentecost Monday"), Some((d(2025, 6, 9), false)));
        assert_eq!(find("Boxing Day"), Some((d(2025, 12, 26), true)));
        assert_eq!(holidays.len(), 16);
    }
}
