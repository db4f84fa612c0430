use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    get_optional_enum, get_optional_str, get_required_enum, get_required_str, parse_payload,
    require_store, respond,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{CorrectionRequest, Decision, LeaveRequest, RequestStatus, Role};
use crate::workflow::{self, ReviewRequest};
use serde::de::DeserializeOwned;
use serde_json::json;

fn submit<R>(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr>
where
    R: ReviewRequest,
    R::Payload: DeserializeOwned,
{
    let store = require_store(&state.store)?;
    let student = state.session.require_role(Role::Student)?;
    let payload: R::Payload = parse_payload(params)?;
    let request: R = workflow::submit(store, student, payload, state.now_utc())?;
    Ok(json!({ "request": request }))
}

fn review<R: ReviewRequest>(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let teacher = state.session.require_role(Role::Teacher)?;
    let id = get_required_str(params, "id")?;
    let decision: Decision = get_required_enum(params, "decision")?;
    let note = get_optional_str(params, "note");
    let request: R = workflow::review(
        store,
        &id,
        decision,
        &teacher.id,
        note.as_deref(),
        state.now_utc(),
    )?;
    Ok(json!({ "request": request }))
}

fn list_mine<R: ReviewRequest>(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user = state.session.require_user()?;
    let requests: Vec<R> = workflow::list_for(store, &user.id)?;
    Ok(json!({ "requests": requests }))
}

fn list_all<R: ReviewRequest>(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let status: Option<RequestStatus> = get_optional_enum(params, "status")?;
    let requests: Vec<R> = workflow::list_all(store, status)?;
    Ok(json!({
        "requests": requests,
        "pendingCount": workflow::pending_count::<R>(store)?,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "leave.submit" => submit::<LeaveRequest>(state, &req.params),
        "leave.review" => review::<LeaveRequest>(state, &req.params),
        "leave.listMine" => list_mine::<LeaveRequest>(state),
        "leave.listAll" => list_all::<LeaveRequest>(state, &req.params),
        "corrections.submit" => submit::<CorrectionRequest>(state, &req.params),
        "corrections.review" => review::<CorrectionRequest>(state, &req.params),
        "corrections.listMine" => list_mine::<CorrectionRequest>(state),
        "corrections.listAll" => list_all::<CorrectionRequest>(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
