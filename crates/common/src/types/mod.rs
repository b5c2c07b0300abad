use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
}

impl Health {
    pub fn ok() -> Self { Self { status: "ok" } }
}

/// JSON error envelope returned by every failing endpoint.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into(), field: None, reason: None }
    }

    pub fn with_field(mut self, field: impl Into<String>, reason: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self.reason = Some(reason.into());
        self
    }
}

/// Envelope for list responses: `{ "data": [...] }`.
#[derive(Serialize, Debug)]
pub struct DataEnvelope<T> {
    pub data: Vec<T>,
}
