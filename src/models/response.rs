use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Cuisine, Operation, ServiceError};

/// Envelope returned by `POST /api/add/cuisine`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CuisineResponse {
    #[serde(rename = "Cuisine")]
    pub cuisine: Option<Cuisine>,
    #[serde(rename = "Message")]
    pub message: Message,
}

/// Envelope returned by `GET /api/all/cuisines`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AllCuisinesResponse {
    #[serde(rename = "Cuisines")]
    pub cuisines: Option<Vec<Cuisine>>,
    #[serde(rename = "Message")]
    pub message: Message,
}

/// Status and diagnostics attached to every envelope
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "ErrorLog", default, skip_serializing_if = "Vec::is_empty")]
    pub error_log: Vec<ErrorLog>,
    #[serde(rename = "HostName", default, skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    #[serde(rename = "Status", default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(rename = "TimeTaken", default, skip_serializing_if = "String::is_empty")]
    pub time_taken: String,
    #[serde(rename = "Count", default, skip_serializing_if = "is_zero")]
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorLog {
    #[serde(rename = "Status", default, skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(rename = "Trace", default, skip_serializing_if = "String::is_empty")]
    pub trace: String,
    #[serde(rename = "RootCause", default, skip_serializing_if = "String::is_empty")]
    pub root_cause: String,
}

fn is_zero(count: &usize) -> bool {
    *count == 0
}

impl ErrorLog {
    pub fn new(trace: impl Into<String>, root_cause: &str, status: StatusCode) -> Self {
        Self {
            status: status.as_u16().to_string(),
            trace: trace.into(),
            root_cause: root_cause.to_string(),
        }
    }
}

impl Message {
    pub fn success() -> Self {
        Self {
            status: StatusCode::OK.as_u16().to_string(),
            ..Default::default()
        }
    }

    /// A message carrying a single error entry, with `Status` set to match
    pub fn failure(trace: impl Into<String>, root_cause: &str, status: StatusCode) -> Self {
        Self {
            error_log: vec![ErrorLog::new(trace, root_cause, status)],
            status: status.as_u16().to_string(),
            ..Default::default()
        }
    }

    pub fn from_service_error(err: &ServiceError, operation: Operation) -> Self {
        let (root_cause, status) = err.root_cause_status(operation);
        Self::failure(err.to_string(), root_cause, status)
    }

    /// HTTP status encoded in `Status`; unparseable or missing values fall
    /// back to 500
    pub fn status_code(&self) -> StatusCode {
        self.status
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Fill in the fields known only once the request is finished
    pub fn stamp(&mut self, host_name: &str, elapsed: Duration) {
        self.host_name = host_name.to_string();
        self.time_taken = format!("{:?}", elapsed);
    }
}

impl CuisineResponse {
    pub fn from_result(result: Result<Cuisine, ServiceError>) -> Self {
        match result {
            Ok(cuisine) => Self {
                cuisine: Some(cuisine),
                message: Message::success(),
            },
            Err(err) => Self {
                cuisine: None,
                message: Message::from_service_error(&err, Operation::Insert),
            },
        }
    }

    pub fn failure(trace: impl Into<String>, root_cause: &str, status: StatusCode) -> Self {
        Self {
            cuisine: None,
            message: Message::failure(trace, root_cause, status),
        }
    }
}

impl AllCuisinesResponse {
    pub fn from_result(result: Result<Vec<Cuisine>, ServiceError>) -> Self {
        match result {
            Ok(cuisines) => {
                let mut message = Message::success();
                message.count = cuisines.len();
                Self {
                    cuisines: Some(cuisines),
                    message,
                }
            }
            Err(err) => Self {
                cuisines: None,
                message: Message::from_service_error(&err, Operation::FindAll),
            },
        }
    }
}
