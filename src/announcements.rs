use crate::error::{PortalError, PortalResult};
use crate::model::{new_id, Announcement, AnnouncementCategory};
use crate::repo::Repo;
use crate::store::KvStore;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

/// Pinned first, then newest date first. Stable, and applied only at read
/// time; storage keeps insertion order.
pub fn list(store: &dyn KvStore) -> anyhow::Result<Vec<Announcement>> {
    let mut all = Repo::<Announcement>::new(store).list()?;
    all.sort_by(|a, b| b.pinned.cmp(&a.pinned).then_with(|| b.date.cmp(&a.date)));
    Ok(all)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub category: AnnouncementCategory,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementPatch {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<AnnouncementCategory>,
    pub date: Option<NaiveDate>,
    pub pinned: Option<bool>,
}

fn required(value: &str, field: &str) -> PortalResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(PortalError::validation(format!("{field} must not be empty")));
    }
    Ok(v.to_string())
}

pub fn create(
    store: &dyn KvStore,
    input: NewAnnouncement,
    author: &str,
    today: NaiveDate,
) -> PortalResult<Announcement> {
    let announcement = Announcement {
        id: new_id("ANN"),
        title: required(&input.title, "title")?,
        body: required(&input.body, "body")?,
        category: input.category,
        date: input.date.unwrap_or(today),
        author: author.to_string(),
        pinned: input.pinned,
    };
    Repo::<Announcement>::new(store).upsert(announcement.clone())?;
    info!(id = %announcement.id, author, "announcement created");
    Ok(announcement)
}

pub fn update(store: &dyn KvStore, id: &str, patch: AnnouncementPatch) -> PortalResult<Announcement> {
    let repo = Repo::<Announcement>::new(store);
    let mut a = repo
        .get(id)?
        .ok_or_else(|| PortalError::not_found("announcement", id))?;
    if let Some(title) = patch.title {
        a.title = required(&title, "title")?;
    }
    if let Some(body) = patch.body {
        a.body = required(&body, "body")?;
    }
    if let Some(category) = patch.category {
        a.category = category;
    }
    if let Some(date) = patch.date {
        a.date = date;
    }
    if let Some(pinned) = patch.pinned {
        a.pinned = pinned;
    }
    repo.upsert(a.clone())?;
    info!(id, "announcement updated");
    Ok(a)
}

/// Returns whether an announcement was removed.
pub fn delete(store: &dyn KvStore, id: &str) -> anyhow::Result<bool> {
    let removed = Repo::<Announcement>::new(store).remove(id)?;
    if removed {
        info!(id, "announcement deleted");
    }
    Ok(removed)
}
