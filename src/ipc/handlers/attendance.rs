use crate::attendance::{self, AttendanceSummary};
use crate::error::PortalError;
use crate::ipc::error::HandlerErr;
use crate::ipc::helpers::{
    get_i64, get_optional_date, get_optional_str, get_required_date, get_required_enum,
    get_required_str, require_store, respond, target_user_id,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{AttendanceStatus, Role};
use crate::users;
use chrono::Datelike;
use serde_json::json;

fn punch(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user = state.session.require_role(Role::Student)?;
    let record = attendance::punch(store, &user.id, state.now_local(), state.config.late_cutoff)?;
    Ok(json!({ "record": record }))
}

fn record(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user = state.session.require_role(Role::Student)?;
    let status: AttendanceStatus = get_required_enum(params, "status")?;
    let record = attendance::record_attendance(store, &user.id, status, state.now_local())?;
    Ok(json!({ "record": record }))
}

fn today(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user_id = target_user_id(&state.session, params)?;
    let date = state.now_local().date();
    let record = attendance::today_attendance(store, &user_id, date)?;
    Ok(json!({ "date": date, "record": record }))
}

fn history(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user_id = target_user_id(&state.session, params)?;
    let records = attendance::attendance_history(store, &user_id)?;
    Ok(json!({
        "records": records,
        "attendanceRate": attendance::attendance_rate(&records),
    }))
}

fn on_date(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let date = get_required_date(params, "date")?;
    let records = attendance::attendance_on(store, date)?;
    Ok(json!({ "date": date, "records": records }))
}

fn correct(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let teacher = state.session.require_role(Role::Teacher)?;
    let student_id = get_required_str(params, "studentId")?;
    let date = get_required_date(params, "date")?;
    let status: AttendanceStatus = get_required_enum(params, "status")?;
    let is_student = users::find_user(store, &student_id)?
        .map_or(false, |u| u.role == Role::Student);
    if !is_student {
        return Err(PortalError::not_found("student", student_id).into());
    }
    let record = attendance::correct_attendance(
        store,
        &student_id,
        date,
        status,
        &teacher.id,
        state.now_local(),
    )?;
    Ok(json!({ "record": record }))
}

fn summary(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user_id = target_user_id(&state.session, params)?;
    let records = attendance::attendance_history(store, &user_id)?;
    let summary = AttendanceSummary::from_records(&records);
    Ok(json!({ "userId": user_id, "summary": summary }))
}

fn monthly(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    let user_id = target_user_id(&state.session, params)?;
    let now = state.now_local().date();
    let year = match params.get("year") {
        Some(v) if !v.is_null() => i32::try_from(get_i64(params, "year")?)
            .map_err(|_| HandlerErr::bad_params(format!("invalid year: {}", v)))?,
        _ => now.year(),
    };
    let month = match params.get("month") {
        Some(v) if !v.is_null() => u32::try_from(get_i64(params, "month")?)
            .map_err(|_| HandlerErr::bad_params(format!("invalid month: {}", v)))?,
        _ => now.month(),
    };
    let report = attendance::monthly_summary(store, &user_id, year, month)?;
    Ok(json!(report))
}

fn roster(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let date = get_optional_date(params, "date")?.unwrap_or_else(|| state.now_local().date());
    let class_name = get_optional_str(params, "className");
    let roster = attendance::day_roster(store, date, class_name.as_deref())?;
    Ok(json!(roster))
}

fn analytics_daily(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let store = require_store(&state.store)?;
    state.session.require_role(Role::Teacher)?;
    let to = get_optional_date(params, "to")?.unwrap_or_else(|| state.now_local().date());
    let from = match get_optional_date(params, "from")? {
        Some(d) => d,
        None => to - chrono::Duration::days(6),
    };
    let days = attendance::daily_breakdown(store, from, to)?;
    Ok(json!({ "from": from, "to": to, "days": days }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "attendance.punch" => punch(state),
        "attendance.record" => record(state, &req.params),
        "attendance.today" => today(state, &req.params),
        "attendance.history" => history(state, &req.params),
        "attendance.on" => on_date(state, &req.params),
        "attendance.correct" => correct(state, &req.params),
        "attendance.summary" => summary(state, &req.params),
        "attendance.monthly" => monthly(state, &req.params),
        "attendance.roster" => roster(state, &req.params),
        "analytics.daily" => analytics_daily(state, &req.params),
        _ => return None,
    };
    Some(respond(req, result))
}
