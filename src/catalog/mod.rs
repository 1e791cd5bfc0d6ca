pub mod shopify;

use crate::llm::GeneratedContent;
use async_trait::async_trait;
use thiserror::Error;

pub use shopify::ShopifyCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub description_html: String,
    pub image_url: Option<String>,
}

/// Full overwrite of a product's copy. Applying the same update twice leaves
/// the record as applying it once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductUpdate {
    pub id: String,
    pub description_html: String,
    /// Empty means "leave the existing tags alone".
    pub tags: Vec<String>,
}

impl ProductUpdate {
    pub fn from_content(id: &str, content: &GeneratedContent) -> Self {
        Self {
            id: id.to_string(),
            description_html: html_paragraph(&content.description),
            tags: content.tags.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog credentials are not configured")]
    Unconfigured,
    #[error("request failed: {0}")]
    Request(String),
    #[error("catalog rejected the request: {0}")]
    Rejected(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("validation errors: {}", .0.join("; "))]
    UserErrors(Vec<String>),
}

/// The external system of record for product listings.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn list_products(&self, limit: usize) -> Result<Vec<CatalogItem>, CatalogError>;

    async fn update_product(&self, update: &ProductUpdate) -> Result<(), CatalogError>;
}

pub fn html_paragraph(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 7);
    escaped.push_str("<p>");
    for ch in text.trim().chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped.push_str("</p>");
    escaped
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Keeps products in memory and records every update call.
    #[derive(Default)]
    pub(crate) struct InMemoryCatalog {
        pub(crate) products: Mutex<HashMap<String, CatalogItem>>,
        pub(crate) updates: Mutex<Vec<ProductUpdate>>,
        pub(crate) fail_updates: bool,
    }

    impl InMemoryCatalog {
        pub(crate) fn with_products(items: Vec<CatalogItem>) -> Self {
            Self {
                products: Mutex::new(items.into_iter().map(|i| (i.id.clone(), i)).collect()),
                ..Default::default()
            }
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail_updates: true,
                ..Default::default()
            }
        }

        pub(crate) fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }

        pub(crate) fn product(&self, id: &str) -> Option<CatalogItem> {
            self.products.lock().unwrap().get(id).cloned()
        }
    }

    pub(crate) fn item(id: &str, title: &str) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            title: title.into(),
            tags: vec!["Old".into()],
            description_html: "<p>old</p>".into(),
            image_url: None,
        }
    }

    #[async_trait]
    impl Catalog for InMemoryCatalog {
        async fn list_products(&self, limit: usize) -> Result<Vec<CatalogItem>, CatalogError> {
            let mut items: Vec<CatalogItem> =
                self.products.lock().unwrap().values().cloned().collect();
            items.sort_by(|a, b| a.id.cmp(&b.id));
            items.truncate(limit);
            Ok(items)
        }

        async fn update_product(&self, update: &ProductUpdate) -> Result<(), CatalogError> {
            self.updates.lock().unwrap().push(update.clone());
            if self.fail_updates {
                return Err(CatalogError::UserErrors(vec!["id: Product does not exist".into()]));
            }
            let mut products = self.products.lock().unwrap();
            let Some(product) = products.get_mut(&update.id) else {
                return Err(CatalogError::UserErrors(vec!["id: Product does not exist".into()]));
            };
            product.description_html = update.description_html.clone();
            if !update.tags.is_empty() {
                product.tags = update.tags.clone();
            }
            Ok(())
        }
    }

    #[test]
    fn paragraph_escapes_markup() {
        assert_eq!(
            html_paragraph(" Tom & Jerry's <b>\"best\"</b> "),
            "<p>Tom &amp; Jerry&#39;s &lt;b&gt;&quot;best&quot;&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn update_wraps_description_and_keeps_tags() {
        let content = GeneratedContent {
            description: "Built to last.".into(),
            tags: vec!["Outdoor".into()],
        };
        let update = ProductUpdate::from_content("gid://shopify/Product/7", &content);
        assert_eq!(update.description_html, "<p>Built to last.</p>");
        assert_eq!(update.tags, vec!["Outdoor"]);
    }

    #[tokio::test]
    async fn applying_same_update_twice_matches_applying_once() {
        let content = GeneratedContent {
            description: "Built to last.".into(),
            tags: vec!["Outdoor".into(), "Durable".into()],
        };
        let update = ProductUpdate::from_content("p1", &content);

        let once = InMemoryCatalog::with_products(vec![item("p1", "Trail Backpack")]);
        once.update_product(&update).await.unwrap();

        let twice = InMemoryCatalog::with_products(vec![item("p1", "Trail Backpack")]);
        twice.update_product(&update).await.unwrap();
        twice.update_product(&update).await.unwrap();

        assert_eq!(once.product("p1"), twice.product("p1"));
        assert_eq!(
            twice.product("p1").unwrap().description_html,
            "<p>Built to last.</p>"
        );
    }
}
