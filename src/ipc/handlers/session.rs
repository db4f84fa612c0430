use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{get_optional_str, require_store, respond};
use crate::ipc::types::{AppState, Request};
use crate::model::{Role, UserView};
use crate::users;
use serde_json::json;

fn login(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    // Matched exactly as typed.
    let email = params
        .get("email")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing email"))?;
    let password = params
        .get("password")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing password"))?;
    let user = state.session.login(store, email, password)?;
    Ok(json!({ "user": user.as_ref().map(UserView::from) }))
}

fn logout(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.logout(store)?;
    Ok(json!({ "ok": true }))
}

fn current(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    require_store(&state.store)?;
    Ok(json!({ "user": state.session.current_user().map(UserView::from) }))
}

fn profile_update(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing name"))?;
    let user = state.session.update_profile(store, name)?;
    Ok(json!({ "user": UserView::from(&user) }))
}

fn students(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let class_name = get_optional_str(params, "className");
    let list: Vec<UserView> = users::list_students(store, class_name.as_deref())?
        .iter()
        .map(UserView::from)
        .collect();
    Ok(json!({ "students": list }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "session.login" => login(state, &req.params),
        "session.logout" => logout(state),
        "session.current" => current(state),
        "profile.update" => profile_update(state, &req.params),
        "users.students" => students(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
