//! Month-calendar grid construction: a pure function of
//! (year, month, events) producing the fixed 6x7 Monday-first grid, plus
//! the clamped month navigation used by the home page.

use chrono::{Datelike, Days, NaiveDate};
use serde_json::Value;
use std::collections::HashMap;

/// Forward navigation never goes past December 2026. There is no lower
/// bound.
pub const MAX_YEAR: i32 = 2026;
pub const MAX_MONTH: u32 = 12;

/// Grid dimensions: always six rows of seven days.
pub const GRID_DAYS: usize = 42;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Seg", "Ter", "Qua", "Qui", "Sex", "Sáb", "Dom"];

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// A (year, month) pair with month in 1..=12, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    /// Build a reference from untrusted input. The month is clamped into
    /// 1..=12 and the year into the navigable range.
    pub fn of(year: i32, month: u32) -> Self {
        let month = month.clamp(1, 12);
        let year = year.max(1);
        Self { year, month }.clamped()
    }

    pub fn current() -> Self {
        let today = chrono::Local::now().date_naive();
        Self::of(today.year(), today.month())
    }

    fn ceiling() -> Self {
        Self { year: MAX_YEAR, month: MAX_MONTH }
    }

    fn clamped(self) -> Self {
        if self > Self::ceiling() {
            Self::ceiling()
        } else {
            self
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// Advance one month; a no-op at the ceiling.
    pub fn next(self) -> Self {
        let candidate = if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        };
        if candidate > Self::ceiling() {
            self
        } else {
            candidate
        }
    }

    /// Human label, e.g. "março de 2025".
    pub fn label(&self) -> String {
        format!("{} de {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// Whether the cell falls within the requested month.
    pub in_month: bool,
    pub has_event: bool,
    /// Titles of the events on this day, in input order.
    pub event_titles: Vec<String>,
}

/// Calendar-day of an event: the date part of its ISO `date` field.
/// Time-of-day and timezone suffixes are ignored by construction.
fn event_day(ev: &Value) -> Option<NaiveDate> {
    let raw = ev.get("date")?.as_str()?;
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn event_title(ev: &Value) -> Option<String> {
    ev.get("title")
        .or_else(|| ev.get("name"))
        .and_then(|t| t.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Compute the 42-cell grid for a month: the Monday-first week containing
/// the 1st through the Sunday six weeks later, covering the trailing days
/// of the prior month and the leading days of the next.
pub fn month_grid(month: MonthRef, events: &[Value]) -> Vec<CalendarCell> {
    let mut by_day: HashMap<NaiveDate, Vec<String>> = HashMap::new();
    for ev in events {
        if let Some(day) = event_day(ev) {
            let titles = by_day.entry(day).or_default();
            if let Some(title) = event_title(ev) {
                titles.push(title);
            }
        }
    }

    let Some(first) = NaiveDate::from_ymd_opt(month.year, month.month, 1) else {
        return Vec::new();
    };
    let offset = first.weekday().num_days_from_monday() as u64;
    let Some(start) = first.checked_sub_days(Days::new(offset)) else {
        return Vec::new();
    };

    (0..GRID_DAYS as u64)
        .filter_map(|i| start.checked_add_days(Days::new(i)))
        .map(|date| {
            let titles = by_day.get(&date).cloned().unwrap_or_default();
            CalendarCell {
                date,
                in_month: date.year() == month.year && date.month() == month.month,
                has_event: by_day.contains_key(&date),
                event_titles: titles,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn ev(date: &str, title: &str) -> Value {
        serde_json::json!({ "date": date, "title": title })
    }

    #[test]
    fn grid_is_always_42_cells_starting_monday() {
        for (year, month) in [(2025, 3), (2024, 2), (2026, 12), (1999, 1), (2025, 6)] {
            let grid = month_grid(MonthRef::of(year, month), &[]);
            assert_eq!(grid.len(), 42, "{}-{}", year, month);
            assert_eq!(grid[0].date.weekday(), Weekday::Mon);
            for row in grid.chunks(7) {
                assert_eq!(row.len(), 7);
                assert_eq!(row[0].date.weekday(), Weekday::Mon);
                assert_eq!(row[6].date.weekday(), Weekday::Sun);
            }
        }
    }

    #[test]
    fn out_of_month_cells_are_flagged() {
        // March 2025 starts on a Saturday: the grid leads with February days.
        let grid = month_grid(MonthRef::of(2025, 3), &[]);
        let in_month: Vec<_> = grid.iter().filter(|c| c.in_month).collect();
        assert_eq!(in_month.len(), 31);
        assert!(!grid[0].in_month);
        assert_eq!(grid[0].date, NaiveDate::from_ymd_opt(2025, 2, 24).unwrap());
        assert_eq!(in_month[0].date.day(), 1);
        assert_eq!(in_month[30].date.day(), 31);
    }

    #[test]
    fn event_marks_exactly_its_day_in_its_month() {
        let events = vec![ev("2025-03-15", "Culto")];
        let march = month_grid(MonthRef::of(2025, 3), &events);
        let flagged: Vec<_> = march.iter().filter(|c| c.has_event).collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].date, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert_eq!(flagged[0].event_titles, vec!["Culto".to_string()]);

        let february = month_grid(MonthRef::of(2025, 2), &events);
        assert!(february.iter().all(|c| !c.has_event));
    }

    #[test]
    fn event_matching_ignores_time_of_day() {
        let events = vec![ev("2025-03-15T19:30:00.000Z", "Ensaio")];
        let grid = month_grid(MonthRef::of(2025, 3), &events);
        let cell = grid.iter().find(|c| c.date.day() == 15 && c.in_month).unwrap();
        assert!(cell.has_event);
    }

    #[test]
    fn titles_keep_input_order_and_fall_back_to_name() {
        let events = vec![
            ev("2025-03-15", "Culto"),
            serde_json::json!({ "date": "2025-03-15", "name": "Reunião" }),
            serde_json::json!({ "date": "2025-03-15" }),
        ];
        let grid = month_grid(MonthRef::of(2025, 3), &events);
        let cell = grid.iter().find(|c| c.has_event).unwrap();
        assert_eq!(cell.event_titles, vec!["Culto".to_string(), "Reunião".to_string()]);
    }

    #[test]
    fn unparsable_dates_are_ignored() {
        let events = vec![ev("soon", "Vago"), serde_json::json!({ "title": "Sem data" })];
        let grid = month_grid(MonthRef::of(2025, 3), &events);
        assert!(grid.iter().all(|c| !c.has_event));
    }

    #[test]
    fn next_clamps_at_december_2026() {
        let ceiling = MonthRef::of(2026, 12);
        assert_eq!(ceiling.next(), ceiling);
        assert_eq!(MonthRef::of(2026, 11).next(), ceiling);
        assert_eq!(MonthRef::of(2025, 12).next(), MonthRef::of(2026, 1));
    }

    #[test]
    fn prev_is_unbounded_and_crosses_years() {
        assert_eq!(MonthRef::of(2025, 1).prev(), MonthRef { year: 2024, month: 12 });
        assert_eq!(MonthRef::of(2025, 7).prev(), MonthRef { year: 2025, month: 6 });
    }

    #[test]
    fn of_clamps_untrusted_input() {
        assert_eq!(MonthRef::of(2030, 5), MonthRef::of(2026, 12));
        assert_eq!(MonthRef::of(2025, 0), MonthRef { year: 2025, month: 1 });
        assert_eq!(MonthRef::of(2025, 13), MonthRef { year: 2025, month: 12 });
    }

    #[test]
    fn month_labels_are_localized() {
        assert_eq!(MonthRef::of(2025, 3).label(), "março de 2025");
        assert_eq!(MonthRef::of(2026, 12).label(), "dezembro de 2026");
    }
}
