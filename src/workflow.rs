//! Pending → approved/rejected review workflow shared by leave and
//! attendance-correction requests.

use crate::error::{PortalError, PortalResult};
use crate::model::{
    new_id, CorrectionRequest, Decision, Entity, LeaveKind, LeaveRequest, RequestStatus, User,
};
use crate::repo::Repo;
use crate::store::KvStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

/// A request entity that moves through the review workflow.
pub trait ReviewRequest: Entity {
    /// What the applicant fills in.
    type Payload;
    const ID_PREFIX: &'static str;

    fn validate(payload: &Self::Payload) -> PortalResult<()>;
    fn open(id: String, applicant: &User, payload: Self::Payload, now: DateTime<Utc>) -> Self;

    fn user_id(&self) -> &str;
    fn status(&self) -> RequestStatus;
    fn created_at(&self) -> DateTime<Utc>;
    fn close(&mut self, status: RequestStatus, reviewer_id: &str, note: Option<String>, now: DateTime<Utc>);
}

fn require_text(value: &str, field: &str) -> PortalResult<()> {
    if value.trim().is_empty() {
        return Err(PortalError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Create a new pending request. Overlapping or repeated submissions are
/// accepted as-is.
pub fn submit<R: ReviewRequest>(
    store: &dyn KvStore,
    applicant: &User,
    payload: R::Payload,
    now: DateTime<Utc>,
) -> PortalResult<R> {
    R::validate(&payload)?;
    let request = R::open(new_id(R::ID_PREFIX), applicant, payload, now);
    Repo::<R>::new(store).upsert(request.clone())?;
    info!(kind = R::KIND, id = request.id(), user_id = %applicant.id, "request submitted");
    Ok(request)
}

/// Decide a pending request. Decided requests are terminal.
pub fn review<R: ReviewRequest>(
    store: &dyn KvStore,
    request_id: &str,
    decision: Decision,
    reviewer_id: &str,
    note: Option<&str>,
    now: DateTime<Utc>,
) -> PortalResult<R> {
    let repo = Repo::<R>::new(store);
    let mut request = repo
        .get(request_id)?
        .ok_or_else(|| PortalError::not_found(R::KIND, request_id))?;
    if request.status() != RequestStatus::Pending {
        return Err(PortalError::InvalidTransition {
            id: request_id.to_string(),
            status: request.status(),
        });
    }
    let note = note
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    request.close(decision.into(), reviewer_id, note, now);
    repo.upsert(request.clone())?;
    info!(
        kind = R::KIND,
        id = request_id,
        reviewer_id,
        status = %request.status(),
        "request reviewed"
    );
    Ok(request)
}

/// A user's own requests, newest first.
pub fn list_for<R: ReviewRequest>(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Vec<R>> {
    let mut requests = Repo::<R>::new(store).find_by(|r| r.user_id() == user_id)?;
    requests.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    Ok(requests)
}

/// Every request in stored order, optionally restricted to one status.
pub fn list_all<R: ReviewRequest>(
    store: &dyn KvStore,
    status: Option<RequestStatus>,
) -> anyhow::Result<Vec<R>> {
    Repo::<R>::new(store).find_by(|r| status.map_or(true, |s| r.status() == s))
}

pub fn pending_count<R: ReviewRequest>(store: &dyn KvStore) -> anyhow::Result<usize> {
    Ok(list_all::<R>(store, Some(RequestStatus::Pending))?.len())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeavePayload {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: LeaveKind,
    pub reason: String,
}

impl ReviewRequest for LeaveRequest {
    type Payload = LeavePayload;
    const ID_PREFIX: &'static str = "LR";

    fn validate(p: &LeavePayload) -> PortalResult<()> {
        require_text(&p.reason, "reason")?;
        if p.start_date > p.end_date {
            return Err(PortalError::validation("startDate must not be after endDate"));
        }
        Ok(())
    }

    fn open(id: String, applicant: &User, p: LeavePayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: applicant.id.clone(),
            student_name: applicant.name.clone(),
            class_name: applicant.class_name.clone().unwrap_or_default(),
            start_date: p.start_date,
            end_date: p.end_date,
            kind: p.kind,
            reason: p.reason.trim().to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            reviewer_id: None,
            reviewer_note: None,
            reviewed_at: None,
        }
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn status(&self) -> RequestStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn close(&mut self, status: RequestStatus, reviewer_id: &str, note: Option<String>, now: DateTime<Utc>) {
        self.status = status;
        self.reviewer_id = Some(reviewer_id.to_string());
        self.reviewer_note = note;
        self.reviewed_at = Some(now);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionPayload {
    pub date: NaiveDate,
    pub correction_kind: String,
    pub reason: String,
}

impl ReviewRequest for CorrectionRequest {
    type Payload = CorrectionPayload;
    const ID_PREFIX: &'static str = "COR";

    fn validate(p: &CorrectionPayload) -> PortalResult<()> {
        require_text(&p.correction_kind, "correctionKind")?;
        require_text(&p.reason, "reason")
    }

    fn open(id: String, applicant: &User, p: CorrectionPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: applicant.id.clone(),
            student_name: applicant.name.clone(),
            class_name: applicant.class_name.clone().unwrap_or_default(),
            date: p.date,
            correction_kind: p.correction_kind.trim().to_string(),
            reason: p.reason.trim().to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            reviewer_id: None,
            reviewer_note: None,
            reviewed_at: None,
        }
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn status(&self) -> RequestStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn close(&mut self, status: RequestStatus, reviewer_id: &str, note: Option<String>, now: DateTime<Utc>) {
        self.status = status;
        self.reviewer_id = Some(reviewer_id.to_string());
        self.reviewer_note = note;
        self.reviewed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::{default_users, seed_defaults};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap()
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).unwrap()
    }

    fn student() -> User {
        default_users().into_iter().find(|u| u.id == "STU002").unwrap()
    }

    fn leave(reason: &str, start: NaiveDate, end: NaiveDate) -> LeavePayload {
        LeavePayload {
            start_date: start,
            end_date: end,
            kind: LeaveKind::Leave,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn submit_creates_pending_with_applicant_details() {
        let store = MemoryStore::new();
        let req: LeaveRequest =
            submit(&store, &student(), leave(" family event ", d(10, 20), d(10, 21)), now()).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
        assert_eq!(req.student_name, "Rizki Pratama");
        assert_eq!(req.class_name, "Kelas 10A");
        assert_eq!(req.reason, "family event");
        assert_eq!(req.created_at, now());
        assert!(req.id.starts_with("LR-"));
    }

    #[test]
    fn submit_validates_reason_and_dates() {
        let store = MemoryStore::new();
        let blank = submit::<LeaveRequest>(&store, &student(), leave("  ", d(10, 20), d(10, 20)), now());
        assert!(matches!(blank, Err(PortalError::Validation(_))));
        let backwards =
            submit::<LeaveRequest>(&store, &student(), leave("x", d(10, 21), d(10, 20)), now());
        assert!(matches!(backwards, Err(PortalError::Validation(_))));
        let no_kind = submit::<CorrectionRequest>(
            &store,
            &student(),
            CorrectionPayload {
                date: d(10, 1),
                correction_kind: "".into(),
                reason: "was there".into(),
            },
            now(),
        );
        assert!(matches!(no_kind, Err(PortalError::Validation(_))));
        assert!(list_all::<LeaveRequest>(&store, None).unwrap().is_empty());
    }

    #[test]
    fn approved_request_is_terminal() {
        let store = MemoryStore::new();
        let l1: LeaveRequest =
            submit(&store, &student(), leave("sick", d(10, 20), d(10, 20)), now()).unwrap();
        let approved: LeaveRequest =
            review(&store, &l1.id, Decision::Approved, "TEA001", Some("OK"), now()).unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        assert_eq!(approved.reviewer_note.as_deref(), Some("OK"));
        assert_eq!(approved.reviewer_id.as_deref(), Some("TEA001"));

        let again = review::<LeaveRequest>(&store, &l1.id, Decision::Rejected, "TEA002", None, now());
        assert!(matches!(
            again,
            Err(PortalError::InvalidTransition {
                status: RequestStatus::Approved,
                ..
            })
        ));
        let stored = Repo::<LeaveRequest>::new(&store).get(&l1.id).unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        assert_eq!(stored.reviewer_id.as_deref(), Some("TEA001"));
    }

    #[test]
    fn rejection_without_note_is_allowed() {
        let store = MemoryStore::new();
        let c: CorrectionRequest = submit(
            &store,
            &student(),
            CorrectionPayload {
                date: d(10, 2),
                correction_kind: "Wrong status".into(),
                reason: "I was on time".into(),
            },
            now(),
        )
        .unwrap();
        let rejected: CorrectionRequest =
            review(&store, &c.id, Decision::Rejected, "TEA001", Some("   "), now()).unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(rejected.reviewer_note, None);
        assert_eq!(rejected.reviewer_id.as_deref(), Some("TEA001"));
    }

    #[test]
    fn review_missing_request_is_not_found() {
        let store = MemoryStore::new();
        let r = review::<LeaveRequest>(&store, "LR-missing", Decision::Approved, "T", None, now());
        assert!(matches!(r, Err(PortalError::NotFound { .. })));
    }

    #[test]
    fn list_for_sorts_newest_first_and_list_all_filters() {
        let store = MemoryStore::new();
        seed_defaults(&store, d(10, 19)).unwrap();
        let me = student();
        let older: LeaveRequest =
            submit(&store, &me, leave("a", d(10, 20), d(10, 20)), now()).unwrap();
        let newer: LeaveRequest = submit(
            &store,
            &me,
            leave("b", d(10, 20), d(10, 22)),
            now() + Duration::hours(1),
        )
        .unwrap();
        let mine = list_for::<LeaveRequest>(&store, &me.id).unwrap();
        let ids: Vec<&str> = mine.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);

        // Two seeded requests (approved) plus two new pending ones.
        assert_eq!(list_all::<LeaveRequest>(&store, None).unwrap().len(), 4);
        assert_eq!(pending_count::<LeaveRequest>(&store).unwrap(), 2);
        review::<LeaveRequest>(&store, &older.id, Decision::Rejected, "TEA001", None, now()).unwrap();
        assert_eq!(pending_count::<LeaveRequest>(&store).unwrap(), 1);
        assert_eq!(
            list_all::<LeaveRequest>(&store, Some(RequestStatus::Approved))
                .unwrap()
                .len(),
            2
        );
    }
}
