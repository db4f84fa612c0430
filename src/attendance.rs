use crate::error::{PortalError, PortalResult};
use crate::model::{new_id, AttendanceRecord, AttendanceStatus, User, UserView};
use crate::repo::Repo;
use crate::store::KvStore;
use crate::users;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Check-ins strictly after this minute are late.
pub const DEFAULT_LATE_CUTOFF: (u32, u32) = (7, 30);

pub fn default_late_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_LATE_CUTOFF.0, DEFAULT_LATE_CUTOFF.1, 0).unwrap_or_default()
}

/// Minute precision: with a 07:30 cutoff, 07:30:59 is present and 07:31 is late.
pub fn derive_status(at: NaiveTime, cutoff: NaiveTime) -> AttendanceStatus {
    if (at.hour(), at.minute()) > (cutoff.hour(), cutoff.minute()) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

fn minute_of(t: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(t.hour(), t.minute(), 0).unwrap_or(t)
}

/// Check a user in for `now`'s date with the caller-supplied status.
///
/// An existing record for the same day is updated in place (same ID, note and
/// check-out kept); otherwise a new record is appended.
pub fn record_attendance(
    store: &dyn KvStore,
    user_id: &str,
    status: AttendanceStatus,
    now: NaiveDateTime,
) -> PortalResult<AttendanceRecord> {
    if !status.is_attended() {
        return Err(PortalError::validation(
            "check-in status must be present or late",
        ));
    }
    let repo = Repo::<AttendanceRecord>::new(store);
    let today = now.date();
    let check_in = minute_of(now.time());
    let record = match repo.find_one(|a| a.user_id == user_id && a.date == today)? {
        Some(mut existing) => {
            existing.check_in_time = Some(check_in);
            existing.status = status;
            existing
        }
        None => AttendanceRecord {
            id: new_id("ATT"),
            user_id: user_id.to_string(),
            date: today,
            check_in_time: Some(check_in),
            check_out_time: None,
            status,
            note: None,
            corrected_by: None,
        },
    };
    repo.upsert(record.clone())?;
    info!(user_id, date = %today, status = ?status, "attendance recorded");
    Ok(record)
}

/// The student-facing check-in: status derived from the time of day.
pub fn punch(
    store: &dyn KvStore,
    user_id: &str,
    now: NaiveDateTime,
    cutoff: NaiveTime,
) -> PortalResult<AttendanceRecord> {
    record_attendance(store, user_id, derive_status(now.time(), cutoff), now)
}

/// Teacher overwrite of a student's status on any date.
pub fn correct_attendance(
    store: &dyn KvStore,
    student_id: &str,
    date: NaiveDate,
    status: AttendanceStatus,
    acting_teacher_id: &str,
    now: NaiveDateTime,
) -> PortalResult<AttendanceRecord> {
    let repo = Repo::<AttendanceRecord>::new(store);
    let mut record = repo
        .find_one(|a| a.user_id == student_id && a.date == date)?
        .unwrap_or_else(|| AttendanceRecord {
            id: new_id("ATT"),
            user_id: student_id.to_string(),
            date,
            check_in_time: None,
            check_out_time: None,
            status,
            note: None,
            corrected_by: None,
        });
    record.status = status;
    if status.is_attended() && record.check_in_time.is_none() {
        record.check_in_time = Some(minute_of(now.time()));
    }
    record.note = match status {
        AttendanceStatus::Excused => Some("Excused by teacher".to_string()),
        AttendanceStatus::Sick => Some("Sick".to_string()),
        _ => None,
    };
    record.corrected_by = Some(acting_teacher_id.to_string());
    repo.upsert(record.clone())?;
    info!(
        student_id,
        %date,
        status = ?status,
        teacher_id = acting_teacher_id,
        "attendance corrected"
    );
    Ok(record)
}

pub fn today_attendance(
    store: &dyn KvStore,
    user_id: &str,
    today: NaiveDate,
) -> anyhow::Result<Option<AttendanceRecord>> {
    Repo::<AttendanceRecord>::new(store).find_one(|a| a.user_id == user_id && a.date == today)
}

/// Unsorted; callers order as they need.
pub fn attendance_history(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<AttendanceRecord>> {
    Repo::<AttendanceRecord>::new(store).find_by(|a| a.user_id == user_id)
}

pub fn attendance_on(store: &dyn KvStore, date: NaiveDate) -> anyhow::Result<Vec<AttendanceRecord>> {
    Repo::<AttendanceRecord>::new(store).find_by(|a| a.date == date)
}

/// `round(100 * part / total)`, rounding halves up; 0 when `total` is 0.
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * part + total) / (2 * total)) as u32
}

/// Share of records that are present or late, as a whole percentage.
pub fn attendance_rate(records: &[AttendanceRecord]) -> u32 {
    let attended = records.iter().filter(|r| r.status.is_attended()).count();
    percent(attended, records.len())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub excused: usize,
    pub sick: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Excused => self.excused += 1,
            AttendanceStatus::Sick => self.sick += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.late + self.absent + self.excused + self.sick
    }

    pub fn attended(&self) -> usize {
        self.present + self.late
    }

    /// Everything that is not an attendance: absent, excused and sick.
    pub fn missed(&self) -> usize {
        self.absent + self.excused + self.sick
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub counts: StatusCounts,
    pub total: usize,
    pub attendance_rate: u32,
    pub late_rate: u32,
    pub absent_rate: u32,
}

impl AttendanceSummary {
    pub fn from_records<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r AttendanceRecord>,
    {
        let mut counts = StatusCounts::default();
        for r in records {
            counts.add(r.status);
        }
        Self::from_counts(counts)
    }

    pub fn from_counts(counts: StatusCounts) -> Self {
        let total = counts.total();
        Self {
            counts,
            total,
            attendance_rate: percent(counts.attended(), total),
            late_rate: percent(counts.late, total),
            absent_rate: percent(counts.missed(), total),
        }
    }
}

/// One user's records within a calendar month, newest first, with totals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAttendance {
    pub year: i32,
    pub month: u32,
    pub records: Vec<AttendanceRecord>,
    pub summary: AttendanceSummary,
}

pub fn monthly_summary(
    store: &dyn KvStore,
    user_id: &str,
    year: i32,
    month: u32,
) -> PortalResult<MonthlyAttendance> {
    if !(1..=12).contains(&month) {
        return Err(PortalError::validation("month must be between 1 and 12"));
    }
    let mut records = Repo::<AttendanceRecord>::new(store).find_by(|a| {
        a.user_id == user_id && a.date.year() == year && a.date.month() == month
    })?;
    records.sort_by(|a, b| b.date.cmp(&a.date));
    let summary = AttendanceSummary::from_records(&records);
    Ok(MonthlyAttendance {
        year,
        month,
        records,
        summary,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student: UserView,
    pub record: Option<AttendanceRecord>,
    /// `absent` when the student has no record for the day.
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRoster {
    pub date: NaiveDate,
    pub entries: Vec<RosterEntry>,
    pub counts: StatusCounts,
    pub student_count: usize,
    /// Present plus late over the number of students on the roster.
    pub attendance_rate: u32,
}

/// Every student (optionally one class) with their status on `date`.
pub fn day_roster(
    store: &dyn KvStore,
    date: NaiveDate,
    class_name: Option<&str>,
) -> anyhow::Result<DayRoster> {
    let students: Vec<User> = users::list_students(store, class_name)?;
    let day = attendance_on(store, date)?;
    let mut counts = StatusCounts::default();
    let entries: Vec<RosterEntry> = students
        .iter()
        .map(|s| {
            let record = day.iter().find(|a| a.user_id == s.id).cloned();
            let status = record
                .as_ref()
                .map(|r| r.status)
                .unwrap_or(AttendanceStatus::Absent);
            counts.add(status);
            RosterEntry {
                student: UserView::from(s),
                record,
                status,
            }
        })
        .collect();
    Ok(DayRoster {
        date,
        student_count: entries.len(),
        attendance_rate: percent(counts.attended(), entries.len()),
        entries,
        counts,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBreakdown {
    pub date: NaiveDate,
    pub counts: StatusCounts,
    pub attendance_rate: u32,
}

/// Per-date status counts for every date in `from..=to` that has records.
pub fn daily_breakdown(
    store: &dyn KvStore,
    from: NaiveDate,
    to: NaiveDate,
) -> PortalResult<Vec<DailyBreakdown>> {
    if from > to {
        return Err(PortalError::validation("from must not be after to"));
    }
    let mut by_date: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();
    for rec in Repo::<AttendanceRecord>::new(store).find_by(|a| a.date >= from && a.date <= to)? {
        by_date.entry(rec.date).or_default().add(rec.status);
    }
    Ok(by_date
        .into_iter()
        .map(|(date, counts)| DailyBreakdown {
            date,
            counts,
            attendance_rate: percent(counts.attended(), counts.total()),
        })
        .collect())
}
