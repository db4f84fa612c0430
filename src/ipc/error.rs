use serde_json::json;

use crate::error::PortalError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

#[derive(Debug)]
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<PortalError> for HandlerErr {
    fn from(e: PortalError) -> Self {
        let details = match &e {
            PortalError::NotFound { kind, id } => Some(json!({ "kind": kind, "id": id })),
            PortalError::InvalidTransition { id, status } => {
                Some(json!({ "id": id, "status": status }))
            }
            PortalError::OutOfStock { book_id } | PortalError::AlreadyBorrowed { book_id } => {
                Some(json!({ "bookId": book_id }))
            }
            PortalError::Forbidden { required } => Some(json!({ "requiredRole": required })),
            _ => None,
        };
        Self {
            code: e.code(),
            message: format!("{e:#}"),
            details,
        }
    }
}

impl From<anyhow::Error> for HandlerErr {
    fn from(e: anyhow::Error) -> Self {
        PortalError::Storage(e).into()
    }
}
