use crate::announcements::{self, AnnouncementPatch, NewAnnouncement};
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_required_str, parse_payload, require_store, respond};
use crate::ipc::types::{AppState, Request};
use crate::model::Role;
use serde_json::json;

fn list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_user()?;
    Ok(json!({ "announcements": announcements::list(store)? }))
}

fn create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let teacher = state.session.require_role(Role::Teacher)?;
    let input: NewAnnouncement = parse_payload(params)?;
    let created = announcements::create(store, input, &teacher.name, state.now_local().date())?;
    Ok(json!({ "announcement": created }))
}

fn update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let id = get_required_str(params, "id")?;
    let patch: AnnouncementPatch = match params.get("patch") {
        Some(p) => parse_payload(p)?,
        None => AnnouncementPatch::default(),
    };
    let updated = announcements::update(store, &id, patch)?;
    Ok(json!({ "announcement": updated }))
}

fn delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let id = get_required_str(params, "id")?;
    Ok(json!({ "removed": announcements::delete(store, &id)? }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "announcements.list" => list(state),
        "announcements.create" => create(state, &req.params),
        "announcements.update" => update(state, &req.params),
        "announcements.delete" => delete(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
