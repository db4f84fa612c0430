use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::error::PortalError;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::types::Request;
use crate::model::{Role, User};
use crate::session::Session;
use crate::store::SqliteStore;

pub fn respond(req: &Request, result: Result<serde_json::Value, HandlerErr>) -> serde_json::Value {
    match result {
        Ok(value) => ok(&req.id, value),
        Err(error) => error.response(&req.id),
    }
}

pub fn require_store(store: &Option<SqliteStore>) -> Result<&SqliteStore, HandlerErr> {
    store.as_ref().ok_or_else(|| HandlerErr {
        code: "no_workspace",
        message: "select a workspace first".to_string(),
        details: None,
    })
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    get_optional_str(params, key)
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Blank strings count as absent.
pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn parse_date(raw: &str, key: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

pub fn get_optional_date(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<NaiveDate>, HandlerErr> {
    get_optional_str(params, key)
        .map(|s| parse_date(&s, key))
        .transpose()
}

pub fn get_required_date(params: &serde_json::Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    let raw = get_required_str(params, key)?;
    parse_date(&raw, key)
}

/// Decode a closed enum (status, decision, weekday, ...) from a string param.
pub fn get_optional_enum<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: &str,
) -> Result<Option<T>, HandlerErr> {
    match params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|_| HandlerErr::bad_params(format!("invalid {}: {}", key, v))),
    }
}

pub fn get_required_enum<T: DeserializeOwned>(
    params: &serde_json::Value,
    key: &str,
) -> Result<T, HandlerErr> {
    get_optional_enum(params, key)?
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Decode the whole params object into a payload struct.
pub fn parse_payload<T: DeserializeOwned>(params: &serde_json::Value) -> Result<T, HandlerErr> {
    serde_json::from_value(params.clone()).map_err(|e| HandlerErr::bad_params(e.to_string()))
}

/// The user a read is about: students may only ask about themselves,
/// teachers may name anyone via `userId`.
pub fn target_user_id(session: &Session, params: &serde_json::Value) -> Result<String, HandlerErr> {
    let me: &User = session.require_user()?;
    match get_optional_str(params, "userId") {
        Some(other) if other != me.id => {
            if me.role != Role::Teacher {
                return Err(PortalError::Forbidden {
                    required: Role::Teacher,
                }
                .into());
            }
            Ok(other)
        }
        _ => Ok(me.id.clone()),
    }
}
