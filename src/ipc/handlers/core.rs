use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::seed;
use crate::session::Session;
use crate::store::SqliteStore;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "signedIn": state.session.current_user().is_some(),
        }),
    )
}

/// Open (or create) the workspace store, seed any missing collections and
/// resume the persisted session.
pub fn open_workspace(state: &mut AppState, path: &Path) -> Result<Vec<&'static str>, HandlerErr> {
    let store = SqliteStore::open(path).map_err(|e| HandlerErr {
        code: "db_open_failed",
        message: format!("{e:#}"),
        details: None,
    })?;
    let seeded = seed::seed_defaults(&store, state.now_local().date())?;
    let session = match Session::restore(&store) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "could not restore session");
            Session::default()
        }
    };
    info!(workspace = %path.display(), seeded = seeded.len(), "workspace opened");
    state.workspace = Some(path.to_path_buf());
    state.store = Some(store);
    state.session = session;
    Ok(seeded)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_required_str(&req.params, "path") {
        Ok(p) => PathBuf::from(p),
        Err(_) => return err(&req.id, "bad_params", "missing params.path", None),
    };
    match open_workspace(state, &path) {
        Ok(seeded) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "seeded": seeded,
            }),
        ),
        Err(e) => e.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
