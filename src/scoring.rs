use crate::calendar::{self, LAST_WEEK, SEMESTER1_LAST_WEEK};
use crate::catalog::{PeriodRank, ViolationKind};
use crate::store::{Store, ViolationRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Weekly class floor; bonuses and deductions move the score around it.
pub const WEEKLY_BASE_SCORE: i64 = 200;
/// Auto-bonus when a class logs no bad period in a week.
pub const FULL_PERIOD_A_BONUS: i64 = 40;
/// Auto-bonus when a class logs no attendance fault in a week.
pub const GOOD_ATTENDANCE_BONUS: i64 = 15;

/// Standard half-away-from-zero rounding used for every displayed average.
pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "TỐT")]
    Good,
    #[serde(rename = "KHÁ")]
    Fair,
    #[serde(rename = "ĐẠT")]
    Pass,
    #[serde(rename = "CHƯA ĐẠT")]
    Fail,
}

impl Classification {
    fn from_score(score: f64) -> Self {
        if score >= 200.0 {
            Classification::Good
        } else if score >= 180.0 {
            Classification::Fair
        } else if score >= 150.0 {
            Classification::Pass
        } else {
            Classification::Fail
        }
    }

    /// One level down; Fail has no further to go.
    pub fn demoted(self) -> Self {
        match self {
            Classification::Good => Classification::Fair,
            Classification::Fair => Classification::Pass,
            Classification::Pass | Classification::Fail => Classification::Fail,
        }
    }
}

/// Classification with the prohibited-act demotion applied.
pub fn classify(score: f64, has_prohibited: bool) -> Classification {
    let base = Classification::from_score(score);
    if has_prohibited {
        base.demoted()
    } else {
        base
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week(i32),
    Month(u32),
    Semester1,
    Semester2,
    Year,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WeekTally {
    bonus: i64,
    individual: i64,
    collective: i64,
}

impl WeekTally {
    fn total(&self) -> i64 {
        WEEKLY_BASE_SCORE + self.bonus - self.individual - self.collective
    }

    fn merge(&mut self, other: &WeekTally) {
        self.bonus += other.bonus;
        self.individual += other.individual;
        self.collective += other.collective;
    }
}

/// One week's bonus/deduction buckets for one class, applying the rules in
/// their required order: auto-bonuses first, manual twins skipped,
/// class faults deduplicated by (kind, day), everything else per instance.
fn week_tally(records: &[&ViolationRecord], multiplier: i64) -> WeekTally {
    let mut tally = WeekTally::default();

    let has_bad_period = records.iter().any(|r| r.kind.is_bad_period());
    if !has_bad_period {
        tally.bonus += FULL_PERIOD_A_BONUS * multiplier;
    }
    let has_bad_attendance = records.iter().any(|r| r.kind.is_bad_attendance());
    if !has_bad_attendance {
        tally.bonus += GOOD_ATTENDANCE_BONUS * multiplier;
    }

    let mut faults_seen: HashSet<(ViolationKind, &str)> = HashSet::new();
    for record in records {
        if record.kind.is_auto_bonus_duplicate() {
            continue;
        }
        if record.kind.is_class_fault() && !faults_seen.insert((record.kind, record.date.as_str()))
        {
            continue;
        }
        let adjusted = record.points * multiplier;
        if record.points > 0 {
            tally.bonus += adjusted;
        } else if record.kind.is_class_fault() {
            tally.collective += adjusted.abs();
        } else {
            tally.individual += adjusted.abs();
        }
    }
    tally
}

/// Records bucketed by (class, week), plus the count of records whose date
/// could not be resolved onto the week grid.
struct WeekBuckets<'a> {
    by_class_week: HashMap<(String, i32), Vec<&'a ViolationRecord>>,
    skipped: usize,
}

fn bucket_records<'a>(records: &'a [ViolationRecord]) -> WeekBuckets<'a> {
    let mut by_class_week: HashMap<(String, i32), Vec<&'a ViolationRecord>> = HashMap::new();
    let mut skipped = 0;
    for record in records {
        let Some(date) = record.resolved_date() else {
            skipped += 1;
            continue;
        };
        let week = calendar::resolve_week(date).week;
        if (1..=LAST_WEEK).contains(&week) {
            by_class_week
                .entry((record.class_name.clone(), week))
                .or_default()
                .push(record);
        }
    }
    WeekBuckets {
        by_class_week,
        skipped,
    }
}

fn multiplier_for(week: i32, boost_week: Option<i32>) -> i64 {
    if boost_week == Some(week) {
        2
    } else {
        1
    }
}

/// Weekly scores for one class across the whole year. Weeks without
/// records are absent from the map and default to 200 downstream.
fn class_week_scores(
    buckets: &WeekBuckets<'_>,
    class_name: &str,
    boost_week: Option<i32>,
) -> HashMap<i32, WeekTally> {
    let mut scores = HashMap::new();
    for week in 1..=LAST_WEEK {
        if let Some(records) = buckets.by_class_week.get(&(class_name.to_string(), week)) {
            scores.insert(week, week_tally(records, multiplier_for(week, boost_week)));
        }
    }
    scores
}

/// A silent week still earns both auto-bonuses, doubled when it is the
/// boosted one.
fn silent_week_tally(week: i32, boost_week: Option<i32>) -> WeekTally {
    WeekTally {
        bonus: (FULL_PERIOD_A_BONUS + GOOD_ATTENDANCE_BONUS) * multiplier_for(week, boost_week),
        ..WeekTally::default()
    }
}

fn week_score(scores: &HashMap<i32, WeekTally>, week: i32, boost_week: Option<i32>) -> i64 {
    scores
        .get(&week)
        .map(WeekTally::total)
        .unwrap_or_else(|| silent_week_tally(week, boost_week).total())
}

fn average_weeks(
    scores: &HashMap<i32, WeekTally>,
    weeks: impl Iterator<Item = i32>,
    current_week: i32,
    boost_week: Option<i32>,
) -> Option<f64> {
    let mut sum = 0_i64;
    let mut count = 0_i64;
    for week in weeks {
        if week <= current_week {
            sum += week_score(scores, week, boost_week);
            count += 1;
        }
    }
    if count > 0 {
        Some(round_off_2_decimals(sum as f64 / count as f64))
    } else {
        None
    }
}

/// Weeks whose closing Sunday falls in the given report month.
fn weeks_in_month(month: u32) -> Vec<i32> {
    (1..=LAST_WEEK)
        .filter(|&week| {
            calendar::week_span(week)
                .map(|(_, end)| chrono::Datelike::month(&end) == month)
                .unwrap_or(false)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetail {
    #[serde(flatten)]
    pub record: ViolationRecord,
    /// Point value after the good-study-week multiplier, when the record's
    /// week is the boosted one.
    pub effective_points: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRow {
    pub class_name: String,
    pub student_count: usize,
    pub base_score: i64,
    pub individual_deductions: i64,
    pub class_deductions: i64,
    pub bonus_points: i64,
    pub total_score: f64,
    pub semester1_avg: f64,
    pub semester2_avg: f64,
    pub year_score: f64,
    pub has_prohibited: bool,
    pub classification: Classification,
    pub details: Vec<RecordDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingReport {
    pub rows: Vec<RankingRow>,
    /// Records excluded from week aggregation because their date did not
    /// parse. Surfaced so callers can flag the anomaly.
    pub skipped_records: usize,
}

/// Builds the ranking table for the requested period. Everything is
/// recomputed from the record stream on each call; nothing derived is
/// cached across calls.
pub fn build_ranking(store: &Store, period: Period, as_of: NaiveDate) -> RankingReport {
    let current_week = calendar::current_school_week(as_of);
    let boost_week = if store.good_study_week() {
        Some(match period {
            Period::Week(week) => week,
            _ => current_week,
        })
    } else {
        None
    };

    let buckets = bucket_records(store.records());
    let mut rows: Vec<RankingRow> = Vec::new();

    for class_name in store.class_names() {
        let scores = class_week_scores(&buckets, &class_name, boost_week);

        let semester1_avg =
            average_weeks(&scores, 1..=SEMESTER1_LAST_WEEK, current_week, boost_week)
                .unwrap_or(200.0);
        let semester2_started = current_week > SEMESTER1_LAST_WEEK;
        let semester2_avg = average_weeks(
            &scores,
            (SEMESTER1_LAST_WEEK + 1)..=LAST_WEEK,
            current_week,
            boost_week,
        )
        .unwrap_or(if semester2_started { 200.0 } else { 0.0 });
        let year_score = if semester2_avg > 0.0 {
            round_off_2_decimals((semester1_avg + semester2_avg * 2.0) / 3.0)
        } else {
            semester1_avg
        };

        let detail_weeks: Vec<i32> = match period {
            Period::Week(week) => vec![week],
            Period::Month(month) => weeks_in_month(month),
            Period::Semester1 => (1..=SEMESTER1_LAST_WEEK).collect(),
            Period::Semester2 => ((SEMESTER1_LAST_WEEK + 1)..=LAST_WEEK).collect(),
            Period::Year => (1..=LAST_WEEK).collect(),
        };

        let total_score = match period {
            // A selector outside the week grid reads as the bare base, not
            // as a silent bonus week.
            Period::Week(week) if !(1..=LAST_WEEK).contains(&week) => WEEKLY_BASE_SCORE as f64,
            Period::Week(week) => week_score(&scores, week, boost_week) as f64,
            Period::Month(month) => {
                let member_weeks = weeks_in_month(month).into_iter();
                average_weeks(&scores, member_weeks, current_week, boost_week).unwrap_or(200.0)
            }
            Period::Semester1 => semester1_avg,
            Period::Semester2 => semester2_avg,
            Period::Year => year_score,
        };

        // Breakdown buckets are meaningful for the short periods only; the
        // averaged views expose just the aggregate figures.
        let (base_score, breakdown) = match period {
            Period::Week(week) if !(1..=LAST_WEEK).contains(&week) => {
                (WEEKLY_BASE_SCORE, WeekTally::default())
            }
            Period::Week(week) => (
                WEEKLY_BASE_SCORE,
                scores
                    .get(&week)
                    .copied()
                    .unwrap_or_else(|| silent_week_tally(week, boost_week)),
            ),
            Period::Month(month) => {
                let mut merged = WeekTally::default();
                let mut counted = 0_i64;
                for week in weeks_in_month(month) {
                    if week <= current_week {
                        match scores.get(&week) {
                            Some(tally) => merged.merge(tally),
                            None => merged.merge(&silent_week_tally(week, boost_week)),
                        }
                        counted += 1;
                    }
                }
                (WEEKLY_BASE_SCORE * counted.max(1), merged)
            }
            _ => (0, WeekTally::default()),
        };

        let mut details: Vec<RecordDetail> = buckets
            .by_class_week
            .iter()
            .filter(|((name, week), _)| *name == class_name && detail_weeks.contains(week))
            .flat_map(|((_, week), records)| {
                let multiplier = multiplier_for(*week, boost_week);
                records.iter().map(move |r| RecordDetail {
                    record: (*r).clone(),
                    effective_points: r.points * multiplier,
                })
            })
            .collect();
        details.sort_by(|a, b| {
            a.record
                .resolved_date()
                .cmp(&b.record.resolved_date())
                .then_with(|| a.record.id.cmp(&b.record.id))
        });

        let has_prohibited = details.iter().any(|d| d.record.kind.is_prohibited());
        let classification = classify(total_score, has_prohibited);

        rows.push(RankingRow {
            student_count: store.active_student_count(&class_name),
            class_name,
            base_score,
            individual_deductions: breakdown.individual,
            class_deductions: breakdown.collective,
            bonus_points: breakdown.bonus,
            total_score,
            semester1_avg,
            semester2_avg,
            year_score,
            has_prohibited,
            classification,
            details,
        });
    }

    rows.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
    });

    RankingReport {
        rows,
        skipped_records: buckets.skipped,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationShare {
    pub classification: Classification,
    pub count: usize,
    pub share_percent: f64,
}

/// Footer totals for the exported report: how many classes landed in each
/// classification band.
pub fn classification_summary(rows: &[RankingRow]) -> Vec<ClassificationShare> {
    let total = rows.len();
    [
        Classification::Good,
        Classification::Fair,
        Classification::Pass,
        Classification::Fail,
    ]
    .into_iter()
    .map(|classification| {
        let count = rows
            .iter()
            .filter(|r| r.classification == classification)
            .count();
        let share_percent = if total > 0 {
            round_off_2_decimals(count as f64 * 100.0 / total as f64)
        } else {
            0.0
        };
        ClassificationShare {
            classification,
            count,
            share_percent,
        }
    })
    .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogbookPeriodEntry {
    pub record_id: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_index: Option<u8>,
    pub rank: PeriodRank,
    pub remark: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogbookAbsenceEntry {
    pub record_id: String,
    pub date: String,
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyLogbook {
    pub class_name: String,
    pub week: i32,
    pub periods: Vec<LogbookPeriodEntry>,
    pub absences: Vec<LogbookAbsenceEntry>,
}

/// The monitor's weekly drill-down: every graded period and every absence
/// for one class and week, rebuilt from the structured record fields.
/// Periods without an entry are rank A by definition.
pub fn weekly_logbook(store: &Store, class_name: &str, week: i32) -> WeeklyLogbook {
    let mut periods = Vec::new();
    let mut absences = Vec::new();
    for record in store.records() {
        if record.class_name != class_name {
            continue;
        }
        let in_week = record
            .resolved_date()
            .map(|d| calendar::resolve_week(d).week == week)
            .unwrap_or(false);
        if !in_week {
            continue;
        }
        if let Some(rank) = record.rank_letter {
            periods.push(LogbookPeriodEntry {
                record_id: record.id.clone(),
                date: record.date.clone(),
                session_id: record.session_id.clone(),
                period_index: record.period_index,
                rank,
                remark: record.note.clone(),
            });
        } else if matches!(
            record.kind,
            ViolationKind::ExcusedAbsence | ViolationKind::UnexcusedAbsence | ViolationKind::ClassCutting
        ) {
            absences.push(LogbookAbsenceEntry {
                record_id: record.id.clone(),
                date: record.date.clone(),
                student_id: record.student_id.clone(),
                student_name: record.student_name.clone(),
                kind: record.kind,
            });
        }
    }
    WeeklyLogbook {
        class_name: class_name.to_string(),
        week,
        periods,
        absences,
    }
}
