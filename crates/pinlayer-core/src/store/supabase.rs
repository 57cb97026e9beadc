//! Remote comment table served by Supabase (PostgREST).

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;

use super::CommentStore;
use crate::config::{compact_text, is_http_url};
use crate::error::{Error, Result};
use crate::models::{Comment, CommentId, CommentPatch, NewComment};

/// Table the comment layer writes to unless configured otherwise
pub const DEFAULT_TABLE: &str = "commenting";

/// `CommentStore` backed by a Supabase table
#[derive(Clone)]
pub struct SupabaseCommentStore {
    table_url: String,
    anon_key: String,
    client: Client,
}

impl std::fmt::Debug for SupabaseCommentStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseCommentStore")
            .field("table_url", &self.table_url)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

impl SupabaseCommentStore {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, table: &str) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::Configuration(
                "Supabase anon key must not be empty".to_string(),
            ));
        }
        let table = table.trim();
        if table.is_empty() {
            return Err(Error::Configuration(
                "Comment table name must not be empty".to_string(),
            ));
        }

        Ok(Self {
            table_url: format!("{rest_url}/{table}"),
            anon_key,
            client: Client::builder().build()?,
        })
    }

    #[must_use]
    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Accept", "application/json")
    }

    fn by_id(&self, id: &CommentId) -> String {
        format!("{}?id={}", self.table_url, id_filter(id))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(parse_api_error(status, &body)));
        }
        Ok(response)
    }
}

impl CommentStore for SupabaseCommentStore {
    async fn list_all(&self, prototype: Option<&str>) -> Result<Vec<Comment>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.asc".to_string()),
        ];
        if let Some(prototype) = prototype {
            query.push(("prototype", format!("eq.{prototype}")));
        }

        let response = self
            .send(self.client.get(&self.table_url).query(&query))
            .await?;
        let rows = response.json::<Vec<Comment>>().await?;
        tracing::debug!("Fetched {} comments from {}", rows.len(), self.table_url);
        Ok(rows)
    }

    async fn insert(&self, comment: &NewComment) -> Result<Comment> {
        let response = self
            .send(
                self.client
                    .post(&self.table_url)
                    .header("Prefer", "return=representation")
                    .json(&[comment]),
            )
            .await?;
        let rows = response.json::<Vec<Comment>>().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::Api("Insert response did not include the new row".to_string()))
    }

    async fn update_fields(&self, id: &CommentId, patch: &CommentPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.send(
            self.client
                .patch(self.by_id(id))
                .header("Prefer", "return=minimal")
                .json(patch),
        )
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &CommentId) -> Result<()> {
        self.send(
            self.client
                .delete(self.by_id(id))
                .header("Prefer", "return=minimal"),
        )
        .await?;
        Ok(())
    }

    async fn import(&self, comments: &[Comment]) -> Result<()> {
        if comments.is_empty() {
            return Ok(());
        }
        self.send(
            self.client
                .post(format!("{}?on_conflict=id", self.table_url))
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(comments),
        )
        .await?;
        Ok(())
    }
}

/// Normalize a Supabase project URL to its REST endpoint
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::Configuration(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(Error::Configuration(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

fn id_filter(id: &CommentId) -> String {
    format!("eq.{}", urlencoding::encode(id.as_str()))
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    message: Option<String>,
    error: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            let mut rendered = message.trim().to_string();
            if let Some(detail) = payload.details.or(payload.hint) {
                rendered.push_str(": ");
                rendered.push_str(detail.trim());
            }
            return format!("{} ({})", rendered, status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
