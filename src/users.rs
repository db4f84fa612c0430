use crate::error::{PortalError, PortalResult};
use crate::model::{Role, User};
use crate::repo::Repo;
use crate::store::KvStore;

pub fn find_user(store: &dyn KvStore, user_id: &str) -> anyhow::Result<Option<User>> {
    Repo::<User>::new(store).get(user_id)
}

/// Students, optionally restricted to one class, in stored order.
pub fn list_students(store: &dyn KvStore, class_name: Option<&str>) -> anyhow::Result<Vec<User>> {
    Repo::<User>::new(store).find_by(|u| {
        u.role == Role::Student
            && class_name.map_or(true, |c| u.class_name.as_deref() == Some(c))
    })
}

/// Rename a user. This is the only field edit allowed outside the engines.
pub fn rename_user(store: &dyn KvStore, user_id: &str, name: &str) -> PortalResult<User> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PortalError::validation("name must not be empty"));
    }
    let repo = Repo::<User>::new(store);
    let mut user = repo
        .get(user_id)?
        .ok_or_else(|| PortalError::not_found("user", user_id))?;
    user.name = name.to_string();
    repo.upsert(user.clone())?;
    Ok(user)
}
