//! # Square REST Client
//!
//! [`PosCatalog`] over Square's v2 REST API.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  catalog/list?types=ITEM,IMAGE[&cursor=]                          │
//! │  POST catalog/batch-retrieve              { object_ids }               │
//! │  POST inventory/counts/batch-retrieve     { catalog_object_ids,        │
//! │                                             states, cursor? }          │
//! │  POST inventory/changes/batch-create      { idempotency_key, changes } │
//! │  POST catalog/images                      multipart: request + file    │
//! │  GET  locations                                                        │
//! │                                                                         │
//! │  Every call: Authorization: Bearer <token>                             │
//! │              Square-Version: <api_version>                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any non-2xx answer becomes `SyncError::SquareApi { status }`. Whether that
//! is fatal for the pass is the orchestrator's decision.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SquareSettings;
use crate::error::{SyncError, SyncResult};
use crate::protocol::{
    BatchChangeRequest, BatchRetrieveCountsRequest, BatchRetrieveCountsResponse,
    BatchRetrieveObjectsRequest, BatchRetrieveObjectsResponse, CatalogObject, CreateImageRequest,
    CreateImageResponse, ImageData, ImageUpload, InventoryChange, InventoryCount,
    ListCatalogResponse, ListLocationsResponse, Location, PosCatalog, OBJECT_TYPE_IMAGE,
    STATE_IN_STOCK,
};

/// Square API client bound to one access token.
#[derive(Debug, Clone)]
pub struct SquareClient {
    client: Client,
    base_url: String,
}

impl SquareClient {
    /// Builds a client with the auth and version headers preset.
    pub fn new(settings: &SquareSettings, access_token: &str) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| SyncError::InvalidConfig("access token is not a valid header".into()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(
            "Square-Version",
            HeaderValue::from_str(&settings.api_version)
                .map_err(|_| SyncError::InvalidConfig("api_version is not a valid header".into()))?,
        );

        let client = Client::builder()
            .user_agent(concat!("swell-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Internal(format!("Square HTTP client: {}", e)))?;

        Ok(SquareClient {
            client,
            base_url: settings.base_url().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends a request and decodes a JSON body, mapping non-2xx to `SquareApi`.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SyncResult<T> {
        let response = check_status(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> SyncResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "Square request failed");
    Err(SyncError::SquareApi {
        status: status.as_u16(),
        body,
    })
}

fn file_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

#[async_trait]
impl PosCatalog for SquareClient {
    async fn list_catalog(&self) -> SyncResult<Vec<CatalogObject>> {
        let mut objects = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("types", "ITEM,IMAGE".to_string())];
            if let Some(c) = cursor.take() {
                query.push(("cursor", c));
            }

            let page: ListCatalogResponse = self
                .send_json(self.client.get(self.url("catalog/list")).query(&query))
                .await?;
            debug!(objects = page.objects.len(), more = page.cursor.is_some(), "Catalog page");
            objects.extend(page.objects);

            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(objects)
    }

    async fn batch_retrieve_objects(&self, object_ids: &[String]) -> SyncResult<Vec<CatalogObject>> {
        if object_ids.is_empty() {
            return Ok(Vec::new());
        }

        let response: BatchRetrieveObjectsResponse = self
            .send_json(
                self.client
                    .post(self.url("catalog/batch-retrieve"))
                    .json(&BatchRetrieveObjectsRequest { object_ids }),
            )
            .await?;
        Ok(response.objects)
    }

    async fn batch_retrieve_counts(&self, variation_ids: &[String]) -> SyncResult<Vec<InventoryCount>> {
        let mut counts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = BatchRetrieveCountsRequest {
                catalog_object_ids: variation_ids,
                states: [STATE_IN_STOCK],
                cursor: cursor.take(),
            };
            let page: BatchRetrieveCountsResponse = self
                .send_json(
                    self.client
                        .post(self.url("inventory/counts/batch-retrieve"))
                        .json(&request),
                )
                .await?;
            counts.extend(page.counts);

            match page.cursor.filter(|c| !c.is_empty()) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(counts)
    }

    async fn batch_create_changes(&self, changes: &[InventoryChange]) -> SyncResult<()> {
        let request = BatchChangeRequest {
            idempotency_key: Uuid::new_v4().to_string(),
            changes,
        };
        let response = self
            .client
            .post(self.url("inventory/changes/batch-create"))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_image(&self, url: &str) -> SyncResult<ImageUpload> {
        // Storefront image hosts must not receive the Square token.
        let response = check_status(
            Client::new()
                .get(url)
                .timeout(Duration::from_secs(30))
                .send()
                .await?,
        )
        .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());
        let bytes = response.bytes().await?.to_vec();
        let file_name = format!("image.{}", file_extension(&content_type));

        Ok(ImageUpload {
            bytes,
            content_type,
            file_name,
        })
    }

    async fn upload_image(&self, object_id: &str, image: ImageUpload) -> SyncResult<String> {
        let request = CreateImageRequest {
            idempotency_key: Uuid::new_v4().to_string(),
            object_id,
            image: CatalogObject {
                object_type: OBJECT_TYPE_IMAGE.to_string(),
                id: "#image".to_string(),
                image_data: Some(ImageData {
                    url: None,
                    name: Some(image.file_name.clone()),
                }),
                ..CatalogObject::default()
            },
        };

        let file = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| SyncError::Internal(format!("image part: {}", e)))?;
        let request_part = Part::text(serde_json::to_string(&request)?)
            .mime_str("application/json")
            .map_err(|e| SyncError::Internal(format!("request part: {}", e)))?;
        let form = Form::new().part("request", request_part).part("file", file);

        let response: CreateImageResponse = self
            .send_json(self.client.post(self.url("catalog/images")).multipart(form))
            .await?;
        Ok(response.image.id)
    }

    async fn list_locations(&self) -> SyncResult<Vec<Location>> {
        let response: ListLocationsResponse = self
            .send_json(self.client.get(self.url("locations")))
            .await?;
        Ok(response.locations)
    }
}
