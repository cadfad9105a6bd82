use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAndQueryResponse {
    pub answer: String,
    pub session_id: String,
}

/// Fields are optional so that a missing value is reported as a client input
/// error rather than a deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDocumentRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, alias = "session_id")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryDocumentResponse {
    pub answer: String,
}
