use crate::core::{Result, Row, WriteRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Wire form of a [`WriteRequest`], optionally delayed.
///
/// ```json
/// {"id":"…","table":"users","row":{"name":"a"},"allowDuplicate":false,"delayMs":250}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMessage {
    pub id: Uuid,
    pub table: String,
    pub row: Row,
    #[serde(default)]
    pub allow_duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl QueuedMessage {
    /// Wraps a request; a zero delay attaches no delay directive.
    pub fn new(request: WriteRequest, delay: Duration) -> Self {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            id: Uuid::new_v4(),
            table: request.table,
            row: request.row,
            allow_duplicate: request.allow_duplicate,
            delay_ms: (delay_ms > 0).then_some(delay_ms),
        }
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    pub fn to_request(&self) -> WriteRequest {
        WriteRequest {
            table: self.table.clone(),
            row: self.row.clone(),
            allow_duplicate: self.allow_duplicate,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
