//! Invocation handler
//!
//! Wraps one engine run in the response shape expected by function-style
//! invocation: `{"statusCode": <u16>, "body": "<json string>"}`.
//!
//! ## Status codes
//!
//! - `200`: the run completed; `body.failed` lists any lists that could not
//!   be reconciled, so a 200 does not mean zero failures
//! - `502`: the upstream dataset could not be fetched; nothing was touched
//! - `500`: any other run-level error

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{SyncEngine, SyncReport};

/// Response returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    /// JSON-encoded [`ResponseBody`]
    pub body: String,
}

/// Decoded response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    /// Lists created this run, in processing order
    pub created: Vec<String>,
    /// Lists that could not be reconciled
    pub failed: Vec<String>,
    pub failed_count: usize,
    /// Run-level error, when the run did not complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SyncReport> for ResponseBody {
    fn from(report: &SyncReport) -> Self {
        Self {
            created: report.created.clone(),
            failed: report.failed.iter().map(|f| f.name.clone()).collect(),
            failed_count: report.failure_count(),
            error: None,
        }
    }
}

impl HandlerResponse {
    fn new(status_code: u16, body: &ResponseBody) -> Self {
        // Serializing a struct of strings and integers cannot fail
        let body = serde_json::to_string(body).unwrap_or_else(|_| String::from("{}"));
        Self { status_code, body }
    }

    /// Decode the body
    pub fn body(&self) -> Result<ResponseBody, crate::Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Run one sync and build the invocation response
///
/// `event` and `context` are accepted for invocation-surface compatibility
/// and are not read.
pub async fn handle(
    engine: &SyncEngine,
    _event: &serde_json::Value,
    _context: &serde_json::Value,
) -> HandlerResponse {
    let response = match engine.run().await {
        Ok(report) => HandlerResponse::new(200, &ResponseBody::from(&report)),
        Err(e) => {
            let status = if e.is_fetch() { 502 } else { 500 };
            HandlerResponse::new(
                status,
                &ResponseBody {
                    error: Some(e.to_string()),
                    ..ResponseBody::default()
                },
            )
        }
    };

    debug!("Finished, with response: {:?}", response);
    response
}
