use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// School-year week numbering for 2025-2026.
///
/// Week 1 is the partial opening span (Fri 05/09 - Sun 07/09). From Monday
/// 08/09 weeks advance one per 7-day block, with two administrative
/// corrections baked in: the recount that took effect on 05/01/2026 and the
/// Tet holiday week (16/02 - 22/02/2026), which carries no week number.
pub const FIRST_WEEK: i32 = 1;
pub const LAST_WEEK: i32 = 35;
pub const PRE_TERM_WEEK: i32 = 0;
pub const HOLIDAY_WEEK: i32 = -1;
pub const SEMESTER1_LAST_WEEK: i32 = 18;

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("fixed school calendar date")
}

pub fn school_year_start() -> NaiveDate {
    ymd(2025, 9, 5)
}

fn first_week_end() -> NaiveDate {
    ymd(2025, 9, 7)
}

fn second_week_start() -> NaiveDate {
    ymd(2025, 9, 8)
}

fn recount_cutover() -> NaiveDate {
    ymd(2026, 1, 5)
}

fn holiday_start() -> NaiveDate {
    ymd(2026, 2, 16)
}

fn holiday_end() -> NaiveDate {
    ymd(2026, 2, 22)
}

/// The frozen reference date the surrounding app treats as "now" when no
/// explicit date is injected (Tuesday of week 24).
pub fn default_reference_date() -> NaiveDate {
    ymd(2026, 2, 24)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Semester {
    First,
    Second,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekInfo {
    pub week: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<Semester>,
    pub report_month: u32,
    pub report_month_label: String,
    pub is_holiday: bool,
    pub week_end: NaiveDate,
}

fn month_label(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.year())
}

fn pre_term(date: NaiveDate) -> WeekInfo {
    WeekInfo {
        week: PRE_TERM_WEEK,
        semester: None,
        report_month: date.month(),
        report_month_label: month_label(date),
        is_holiday: false,
        week_end: school_year_start(),
    }
}

/// Maps a calendar date onto the school-year week grid. Total over all
/// dates: anything before the year opens or past week 35 resolves to the
/// pre-term sentinel with a best-effort month label.
///
/// The report month comes from the Sunday closing the raw calendar week,
/// so two records in the same week but different months share a label.
pub fn resolve_week(date: NaiveDate) -> WeekInfo {
    if date < school_year_start() {
        return pre_term(date);
    }
    if date <= first_week_end() {
        return WeekInfo {
            week: FIRST_WEEK,
            semester: Some(Semester::First),
            report_month: 9,
            report_month_label: "9/2025".to_string(),
            is_holiday: false,
            week_end: first_week_end(),
        };
    }

    let blocks = (date - second_week_start()).num_days() / 7;
    let mut week = blocks as i32 + 2;
    if date >= recount_cutover() {
        week -= 1;
    }
    if date >= holiday_start() && date <= holiday_end() {
        return WeekInfo {
            week: HOLIDAY_WEEK,
            semester: None,
            report_month: 2,
            report_month_label: "2/2026".to_string(),
            is_holiday: true,
            week_end: holiday_end(),
        };
    }
    if date > holiday_end() {
        week -= 1;
    }
    if week > LAST_WEEK {
        return pre_term(date);
    }

    let week_end = second_week_start() + Duration::days(blocks * 7 + 6);
    let semester = if week <= SEMESTER1_LAST_WEEK {
        Semester::First
    } else {
        Semester::Second
    };
    WeekInfo {
        week,
        semester: Some(semester),
        report_month: week_end.month(),
        report_month_label: month_label(week_end),
        is_holiday: false,
        week_end,
    }
}

/// Inverts the week numbering back to a date span. The recount means the
/// calendar week of 29/12 shares number 18 with the week of 05/01; the
/// span reported for 18 is the post-recount one, matching the listings the
/// administration publishes.
pub fn week_span(week: i32) -> Option<(NaiveDate, NaiveDate)> {
    match week {
        FIRST_WEEK => Some((school_year_start(), first_week_end())),
        2..=LAST_WEEK => {
            let mut blocks = i64::from(week) - 2;
            if week >= SEMESTER1_LAST_WEEK {
                blocks += 1;
            }
            if week >= 24 {
                blocks += 1;
            }
            let start = second_week_start() + Duration::days(blocks * 7);
            Some((start, start + Duration::days(6)))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSpan {
    pub week: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Every numbered week of the year with its date span. The holiday block
/// has no number, so it never shows up here.
pub fn list_weeks() -> Vec<WeekSpan> {
    (FIRST_WEEK..=LAST_WEEK)
        .filter_map(|week| week_span(week).map(|(start, end)| WeekSpan { week, start, end }))
        .collect()
}

/// The school week the given date belongs to for aggregation cutoffs.
/// Inside the holiday block this falls back to the last completed week
/// before it, so semester averages keep their reached-week denominators.
pub fn current_school_week(as_of: NaiveDate) -> i32 {
    let info = resolve_week(as_of);
    if info.is_holiday {
        resolve_week(holiday_start() - Duration::days(1)).week
    } else {
        info.week
    }
}

/// Record dates travel as day-level `D/M/YYYY` strings (with or without
/// zero padding). Returns None for anything unparseable.
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.trim().splitn(3, '/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_day(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2025, 8, 20, PRE_TERM_WEEK)]
    #[case(2025, 9, 5, 1)]
    #[case(2025, 9, 7, 1)]
    #[case(2025, 9, 8, 2)]
    #[case(2025, 9, 14, 2)]
    #[case(2025, 12, 22, 17)]
    // The recount makes both these calendar weeks resolve to 18.
    #[case(2025, 12, 29, 18)]
    #[case(2026, 1, 5, 18)]
    #[case(2026, 1, 12, 19)]
    #[case(2026, 2, 15, 23)]
    #[case(2026, 2, 16, HOLIDAY_WEEK)]
    #[case(2026, 2, 22, HOLIDAY_WEEK)]
    #[case(2026, 2, 23, 24)]
    #[case(2026, 2, 24, 24)]
    #[case(2026, 5, 17, 35)]
    #[case(2026, 5, 18, PRE_TERM_WEEK)]
    fn resolves_week_numbers(
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] expected: i32,
    ) {
        assert_eq!(resolve_week(ymd(year, month, day)).week, expected);
    }

    #[test]
    fn holiday_block_is_flagged() {
        let info = resolve_week(ymd(2026, 2, 18));
        assert!(info.is_holiday);
        assert_eq!(info.report_month_label, "2/2026");
        assert_eq!(info.week_end, ymd(2026, 2, 22));
    }

    #[test]
    fn report_month_follows_week_ending_sunday() {
        // Week 24 runs Mon 23/02 - Sun 01/03, so both dates report March.
        let feb = resolve_week(ymd(2026, 2, 24));
        let mar = resolve_week(ymd(2026, 3, 1));
        assert_eq!(feb.week, 24);
        assert_eq!(mar.week, 24);
        assert_eq!(feb.report_month, 3);
        assert_eq!(feb.report_month_label, "3/2026");
        assert_eq!(feb.report_month_label, mar.report_month_label);
    }

    #[test]
    fn semesters_split_at_week_18() {
        assert_eq!(
            resolve_week(ymd(2026, 1, 5)).semester,
            Some(Semester::First)
        );
        assert_eq!(
            resolve_week(ymd(2026, 1, 12)).semester,
            Some(Semester::Second)
        );
        assert_eq!(resolve_week(ymd(2025, 8, 1)).semester, None);
    }

    #[rstest]
    #[case(1, 2025, 9, 5)]
    #[case(2, 2025, 9, 8)]
    #[case(17, 2025, 12, 22)]
    #[case(18, 2026, 1, 5)]
    #[case(23, 2026, 2, 9)]
    #[case(24, 2026, 2, 23)]
    #[case(35, 2026, 5, 11)]
    fn week_spans_invert_the_numbering(
        #[case] week: i32,
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
    ) {
        let (start, _) = week_span(week).expect("numbered week");
        assert_eq!(start, ymd(year, month, day));
        if week > FIRST_WEEK {
            assert_eq!(resolve_week(start).week, week);
        }
    }

    #[test]
    fn week_span_rejects_sentinels() {
        assert!(week_span(PRE_TERM_WEEK).is_none());
        assert!(week_span(HOLIDAY_WEEK).is_none());
        assert!(week_span(36).is_none());
    }

    #[test]
    fn lists_all_numbered_weeks() {
        let weeks = list_weeks();
        assert_eq!(weeks.len(), 35);
        assert_eq!(weeks[0].week, 1);
        assert_eq!(weeks[34].end, ymd(2026, 5, 17));
    }

    #[test]
    fn current_week_inside_holiday_falls_back() {
        assert_eq!(current_school_week(ymd(2026, 2, 18)), 23);
        assert_eq!(current_school_week(default_reference_date()), 24);
    }

    #[rstest]
    #[case("24/2/2026", Some((2026, 2, 24)))]
    #[case("05/09/2025", Some((2025, 9, 5)))]
    #[case("31/2/2026", None)]
    #[case("not-a-date", None)]
    #[case("", None)]
    fn parses_day_strings(#[case] raw: &str, #[case] expected: Option<(i32, u32, u32)>) {
        assert_eq!(parse_day(raw), expected.map(|(y, m, d)| ymd(y, m, d)));
    }

    #[test]
    fn day_format_round_trips() {
        let date = ymd(2026, 2, 24);
        assert_eq!(parse_day(&format_day(date)), Some(date));
    }
}
