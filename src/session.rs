use crate::error::{PortalError, PortalResult};
use crate::model::{Role, User};
use crate::repo::Repo;
use crate::store::KvStore;
use crate::users;
use anyhow::Context;
use tracing::{info, warn};

pub const CURRENT_USER_KEY: &str = "currentUser";

/// The single signed-in user, held by the process and mirrored to the
/// `currentUser` key so a restarted sidecar resumes the same session.
///
/// Credentials are compared in plaintext against the local user list. This is
/// not a security boundary.
#[derive(Debug, Default, Clone)]
pub struct Session {
    user: Option<User>,
}

impl Session {
    pub fn restore(store: &dyn KvStore) -> anyhow::Result<Self> {
        let Some(bytes) = store.get(CURRENT_USER_KEY)? else {
            return Ok(Self::default());
        };
        match serde_json::from_slice::<User>(&bytes) {
            Ok(user) => Ok(Self { user: Some(user) }),
            Err(e) => {
                warn!(error = %e, "stored session is unreadable; starting signed out");
                Ok(Self::default())
            }
        }
    }

    pub fn login(
        &mut self,
        store: &dyn KvStore,
        email: &str,
        password: &str,
    ) -> anyhow::Result<Option<User>> {
        let found = Repo::<User>::new(store).find_one(|u| u.email == email && u.password == password)?;
        let Some(user) = found else {
            info!(email, "login rejected");
            return Ok(None);
        };
        self.persist(store, user.clone())?;
        info!(user_id = %user.id, role = %user.role, "logged in");
        Ok(Some(user))
    }

    pub fn logout(&mut self, store: &dyn KvStore) -> anyhow::Result<()> {
        store.remove(CURRENT_USER_KEY)?;
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "logged out");
        }
        Ok(())
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> PortalResult<&User> {
        self.user.as_ref().ok_or(PortalError::Unauthenticated)
    }

    pub fn require_role(&self, role: Role) -> PortalResult<&User> {
        let user = self.require_user()?;
        if user.role != role {
            return Err(PortalError::Forbidden { required: role });
        }
        Ok(user)
    }

    /// Rename the signed-in user and refresh the session slot.
    pub fn update_profile(&mut self, store: &dyn KvStore, name: &str) -> PortalResult<User> {
        let user_id = self.require_user()?.id.clone();
        let updated = users::rename_user(store, &user_id, name)?;
        self.persist(store, updated.clone())?;
        Ok(updated)
    }

    fn persist(&mut self, store: &dyn KvStore, user: User) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec(&user).context("failed to encode session")?;
        store.set(CURRENT_USER_KEY, &bytes)?;
        self.user = Some(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_defaults;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        seed_defaults(&store, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()).unwrap();
        store
    }

    #[test]
    fn login_matches_exact_credentials_only() {
        let store = seeded();
        let mut session = Session::default();
        let miss = session
            .login(&store, "FADHILA@siswa.sman1mayong.sch.id", "siswa123")
            .unwrap();
        assert!(miss.is_none());
        assert!(session.current_user().is_none());
        assert!(store.get(CURRENT_USER_KEY).unwrap().is_none());

        let hit = session
            .login(&store, "fadhila@siswa.sman1mayong.sch.id", "siswa123")
            .unwrap()
            .expect("login");
        assert_eq!(hit.id, "STU001");
        assert_eq!(session.require_role(Role::Student).unwrap().id, "STU001");
        assert!(matches!(
            session.require_role(Role::Teacher),
            Err(PortalError::Forbidden {
                required: Role::Teacher
            })
        ));
    }

    #[test]
    fn session_survives_restore_and_clears_on_logout() {
        let store = seeded();
        let mut session = Session::default();
        session
            .login(&store, "andi.susanto@guru.sman1mayong.sch.id", "guru123")
            .unwrap();
        let restored = Session::restore(&store).unwrap();
        assert_eq!(restored.current_user().map(|u| u.id.as_str()), Some("TEA002"));

        session.logout(&store).unwrap();
        assert!(matches!(session.require_user(), Err(PortalError::Unauthenticated)));
        assert!(Session::restore(&store).unwrap().current_user().is_none());
    }

    #[test]
    fn profile_update_refreshes_slot() {
        let store = seeded();
        let mut session = Session::default();
        assert!(matches!(
            session.update_profile(&store, "Nobody"),
            Err(PortalError::Unauthenticated)
        ));
        session
            .login(&store, "maya@siswa.sman1mayong.sch.id", "siswa123")
            .unwrap();
        session.update_profile(&store, "Maya S.").unwrap();
        assert_eq!(session.current_user().unwrap().name, "Maya S.");
        let restored = Session::restore(&store).unwrap();
        assert_eq!(restored.current_user().unwrap().name, "Maya S.");
    }
}
