use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

use crate::models::submission::Submission;

/// Flattened, display-ready view of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSubmission {
    #[serde(flatten)]
    pub submission: Submission,
    pub refleksi_1: String,
    pub refleksi_2: String,
    pub refleksi_3: String,
    pub refleksi_4: String,
    pub target_upgrade: String,
    pub skor_formatted: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KeyValuePair {
    pub key: String,
    #[schema(value_type = Object)]
    pub value: JsonValue,
}

/// Raw submission plus both answer columns as key/value lists.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedSubmission {
    #[serde(flatten)]
    pub submission: Submission,
    pub jawaban_refleksi_parsed: Vec<KeyValuePair>,
    pub jawaban_kuis_parsed: Vec<KeyValuePair>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<JsonValue>,
}
