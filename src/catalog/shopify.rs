use super::{Catalog, CatalogError, CatalogItem, ProductUpdate};
use crate::config::ShopifySettings;
use crate::http::truncate_body;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use serde_with::skip_serializing_none;
use tracing::{debug, warn};

const PRODUCTS_QUERY: &str = r#"query Products($first: Int!) {
  products(first: $first) {
    edges {
      node {
        id
        title
        tags
        descriptionHtml
        images(first: 1) { nodes { url } }
      }
    }
  }
}"#;

const PRODUCT_UPDATE_MUTATION: &str = r#"mutation ProductUpdate($input: ProductInput!) {
  productUpdate(input: $input) {
    product { id }
    userErrors { field message }
  }
}"#;

/// Shopify Admin GraphQL catalog.
#[derive(Debug, Clone)]
pub struct ShopifyCatalog {
    http: Client,
    endpoint: Option<String>,
    access_token: Option<String>,
}

impl ShopifyCatalog {
    pub fn new(http: Client, endpoint: Option<String>, access_token: Option<String>) -> Self {
        Self {
            http,
            endpoint,
            access_token,
        }
    }

    pub fn from_settings(settings: &ShopifySettings, http: Client) -> Self {
        let catalog = Self::new(http, settings.endpoint(), settings.access_token.clone());
        if !catalog.is_configured() {
            warn!(
                target = "optimizer.catalog",
                "SHOPIFY_STORE_URL or SHOPIFY_ACCESS_TOKEN missing; catalog calls will fail"
            );
        }
        catalog
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some() && self.access_token.is_some()
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, CatalogError> {
        let (Some(endpoint), Some(token)) = (&self.endpoint, &self.access_token) else {
            return Err(CatalogError::Unconfigured);
        };

        let response = self
            .http
            .post(endpoint)
            .header("X-Shopify-Access-Token", token)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|err| CatalogError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Rejected(format!(
                "HTTP {status}: {}",
                truncate_body(&body, 200)
            )));
        }

        let payload: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|err| CatalogError::InvalidResponse(err.to_string()))?;
        if !payload.errors.is_empty() {
            let messages: Vec<String> = payload.errors.into_iter().map(|e| e.message).collect();
            return Err(CatalogError::Rejected(messages.join("; ")));
        }
        payload
            .data
            .ok_or_else(|| CatalogError::InvalidResponse("missing data".into()))
    }
}

#[async_trait]
impl Catalog for ShopifyCatalog {
    async fn list_products(&self, limit: usize) -> Result<Vec<CatalogItem>, CatalogError> {
        let data: ProductsData = self
            .execute(PRODUCTS_QUERY, json!({ "first": limit }))
            .await?;
        let items: Vec<CatalogItem> = data
            .products
            .edges
            .into_iter()
            .map(|edge| {
                let node = edge.node;
                CatalogItem {
                    id: node.id,
                    title: node.title,
                    tags: node.tags,
                    description_html: node.description_html.unwrap_or_default(),
                    image_url: node
                        .images
                        .and_then(|images| images.nodes.into_iter().next())
                        .map(|image| image.url),
                }
            })
            .collect();
        debug!(target = "optimizer.catalog", count = items.len(), "products_listed");
        Ok(items)
    }

    async fn update_product(&self, update: &ProductUpdate) -> Result<(), CatalogError> {
        let input = ProductInput {
            id: &update.id,
            description_html: &update.description_html,
            tags: (!update.tags.is_empty()).then_some(update.tags.as_slice()),
        };
        let data: ProductUpdateData = self
            .execute(PRODUCT_UPDATE_MUTATION, json!({ "input": input }))
            .await?;
        let payload = data
            .product_update
            .ok_or_else(|| CatalogError::InvalidResponse("missing productUpdate".into()))?;

        if !payload.user_errors.is_empty() {
            let errors = payload
                .user_errors
                .into_iter()
                .map(|err| match err.field {
                    Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), err.message),
                    _ => err.message,
                })
                .collect();
            return Err(CatalogError::UserErrors(errors));
        }
        if payload.product.is_none() {
            return Err(CatalogError::InvalidResponse("no product returned".into()));
        }
        debug!(target = "optimizer.catalog", product_id = %update.id, "product_updated");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductInput<'a> {
    id: &'a str,
    description_html: &'a str,
    tags: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
struct ProductConnection {
    #[serde(default)]
    edges: Vec<ProductEdge>,
}

#[derive(Debug, Deserialize)]
struct ProductEdge {
    node: ProductNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductNode {
    id: String,
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    description_html: Option<String>,
    images: Option<ImageConnection>,
}

#[derive(Debug, Deserialize)]
struct ImageConnection {
    #[serde(default)]
    nodes: Vec<ImageNode>,
}

#[derive(Debug, Deserialize)]
struct ImageNode {
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductUpdateData {
    product_update: Option<ProductUpdatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductUpdatePayload {
    product: Option<UpdatedProduct>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct UpdatedProduct {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserError {
    field: Option<Vec<String>>,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server, test_client};
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::Value;

    fn catalog(endpoint: String) -> ShopifyCatalog {
        ShopifyCatalog::new(test_client(), Some(endpoint), Some("shpat_test".into()))
    }

    #[tokio::test]
    async fn lists_products_with_first_image() {
        let router = Router::new().route(
            "/graphql.json",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(
                    headers
                        .get("x-shopify-access-token")
                        .and_then(|v| v.to_str().ok()),
                    Some("shpat_test")
                );
                assert_eq!(body["variables"]["first"], 8);
                Json(json!({
                    "data": { "products": { "edges": [
                        { "node": {
                            "id": "gid://shopify/Product/1",
                            "title": "Trail Backpack",
                            "tags": ["Bags"],
                            "descriptionHtml": "<p>Old</p>",
                            "images": { "nodes": [{ "url": "https://cdn.example/p1.jpg" }] }
                        } },
                        { "node": {
                            "id": "gid://shopify/Product/2",
                            "title": "Desk Lamp",
                            "tags": [],
                            "descriptionHtml": null,
                            "images": { "nodes": [] }
                        } }
                    ] } }
                }))
            }),
        );
        let base = spawn_server(router).await;
        let items = catalog(format!("{base}/graphql.json"))
            .list_products(8)
            .await
            .expect("products");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.example/p1.jpg"));
        assert_eq!(items[1].description_html, "");
        assert!(items[1].image_url.is_none());
    }

    #[tokio::test]
    async fn update_sends_input_and_omits_empty_tags() {
        let router = Router::new().route(
            "/graphql.json",
            post(|Json(body): Json<Value>| async move {
                let input = &body["variables"]["input"];
                assert_eq!(input["id"], "gid://shopify/Product/1");
                assert_eq!(input["descriptionHtml"], "<p>New copy.</p>");
                assert!(input.get("tags").is_none());
                Json(json!({
                    "data": { "productUpdate": {
                        "product": { "id": "gid://shopify/Product/1" },
                        "userErrors": []
                    } }
                }))
            }),
        );
        let base = spawn_server(router).await;
        let update = ProductUpdate {
            id: "gid://shopify/Product/1".into(),
            description_html: "<p>New copy.</p>".into(),
            tags: vec![],
        };
        catalog(format!("{base}/graphql.json"))
            .update_product(&update)
            .await
            .expect("updated");
    }

    #[tokio::test]
    async fn user_errors_are_surfaced() {
        let router = Router::new().route(
            "/graphql.json",
            post(|| async {
                Json(json!({
                    "data": { "productUpdate": {
                        "product": null,
                        "userErrors": [{ "field": ["tags"], "message": "Tags is too long" }]
                    } }
                }))
            }),
        );
        let base = spawn_server(router).await;
        let update = ProductUpdate {
            id: "gid://shopify/Product/1".into(),
            description_html: "<p>x</p>".into(),
            tags: vec!["a".into()],
        };
        let err = catalog(format!("{base}/graphql.json"))
            .update_product(&update)
            .await
            .expect_err("user errors");
        match err {
            CatalogError::UserErrors(errors) => assert_eq!(errors, vec!["tags: Tags is too long"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn top_level_graphql_errors_are_rejections() {
        let router = Router::new().route(
            "/graphql.json",
            post(|| async { Json(json!({ "errors": [{ "message": "Throttled" }] })) }),
        );
        let base = spawn_server(router).await;
        let err = catalog(format!("{base}/graphql.json"))
            .list_products(8)
            .await
            .expect_err("throttled");
        assert!(matches!(err, CatalogError::Rejected(ref msg) if msg == "Throttled"));
    }

    #[tokio::test]
    async fn http_errors_and_transport_failures() {
        let router = Router::new().route(
            "/graphql.json",
            post(|| async { (StatusCode::UNAUTHORIZED, "Invalid API key or access token") }),
        );
        let base = spawn_server(router).await;
        let err = catalog(format!("{base}/graphql.json"))
            .list_products(8)
            .await
            .expect_err("unauthorized");
        assert!(matches!(err, CatalogError::Rejected(_)));

        let closed = closed_port_url().await;
        let err = catalog(format!("{closed}/graphql.json"))
            .list_products(8)
            .await
            .expect_err("transport");
        assert!(matches!(err, CatalogError::Request(_)));
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_io() {
        let catalog = ShopifyCatalog::new(test_client(), None, None);
        assert!(!catalog.is_configured());
        let err = catalog.list_products(8).await.expect_err("unconfigured");
        assert!(matches!(err, CatalogError::Unconfigured));
    }
}
