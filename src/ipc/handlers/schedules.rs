use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_enum, get_optional_str, require_store, respond};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, Weekday};
use crate::schedules;
use serde_json::json;

/// Students see their own class; teachers name one with `className`.
fn class_for(state: &AppState, params: &serde_json::Value) -> Result<String, HandlerErr> {
    let user = state.session.require_user()?;
    let requested = get_optional_str(params, "className");
    match (user.role, requested) {
        (Role::Teacher, Some(c)) => Ok(c),
        (_, _) => user
            .class_name
            .clone()
            .ok_or_else(|| HandlerErr::bad_params("missing className")),
    }
}

fn list(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let class_name = class_for(state, params)?;
    let weekday: Option<Weekday> = get_optional_enum(params, "weekday")?;
    let list = schedules::schedules_for(store, &class_name, weekday)?;
    Ok(json!({ "className": class_name, "schedules": list }))
}

fn today(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let class_name = class_for(state, params)?;
    let list = schedules::today_schedules(store, &class_name, state.now_local().date())?;
    Ok(json!({ "className": class_name, "schedules": list }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "schedules.list" => list(state, &req.params),
        "schedules.today" => today(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
