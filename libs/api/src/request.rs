use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    /// Stream identifier, derived from `source_url` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub source_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StreamQuery {
    #[serde(default)]
    pub url: Option<String>,
}
