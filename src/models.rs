use crate::catalog::CatalogItem;
use crate::llm::GeneratedContent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// Product row served to the dashboard, in Shopify's node shape.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub description_html: String,
    pub images: ImageConnection,
}

#[derive(Debug, Serialize, Clone, Default)]
pub struct ImageConnection {
    pub nodes: Vec<ImageNode>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ImageNode {
    pub url: String,
}

impl From<CatalogItem> for ProductView {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id,
            title: item.title,
            tags: item.tags,
            description_html: item.description_html,
            images: ImageConnection {
                nodes: item.image_url.map(|url| ImageNode { url }).into_iter().collect(),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OptimizeResponse {
    pub success: bool,
    /// Engine that produced `data`; `local-fallback` when no provider did.
    pub engine: String,
    pub data: GeneratedContent,
    pub stages: Vec<StageReport>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
