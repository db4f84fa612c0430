use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::config::Config;
use crate::session::Session;
use crate::store::SqliteStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
    pub session: Session,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            workspace: None,
            store: None,
            session: Session::default(),
            config,
        }
    }

    /// Local wall-clock time, unless pinned by configuration.
    pub fn now_local(&self) -> NaiveDateTime {
        self.config
            .fixed_now
            .unwrap_or_else(|| Local::now().naive_local())
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        match self.config.fixed_now {
            Some(t) => t.and_utc(),
            None => Utc::now(),
        }
    }
}
