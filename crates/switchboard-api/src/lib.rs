// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking HTTP implementation of the channel store against the management
//! API. Transport problems come back as errors; server-side rejections come
//! back inside the response envelope.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use switchboard_app::{
    ChannelDraft, ChannelId, ChannelPage, ChannelRow, ChannelStore, ChannelUpdate, Envelope,
    ListQuery, ModelInfo,
};
use url::Url;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("server.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("parse server.base_url {trimmed:?}"))?;
        match base_url.scheme() {
            "http" | "https" => {}
            other => bail!("server.base_url must be http or https, got {other:?}"),
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Appends path segments to the base URL; segments are percent-encoded,
    /// so tag names with slashes or spaces travel safely.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("server.base_url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = request
            .send()
            .map_err(|error| connection_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode response envelope")
    }
}

impl ChannelStore for Client {
    fn list_channels(&mut self, query: &ListQuery) -> Result<Envelope<ChannelPage>> {
        let url = self.endpoint(&["channels"])?;
        self.execute(self.http.get(url).query(&query.query_pairs()))
    }

    fn get_channel(&mut self, id: ChannelId) -> Result<Envelope<ChannelRow>> {
        let url = self.endpoint(&["channels", &id.get().to_string()])?;
        self.execute(self.http.get(url))
    }

    fn create_channel(&mut self, draft: &ChannelDraft) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels"])?;
        self.execute(self.http.post(url).json(draft))
    }

    fn update_channel(
        &mut self,
        id: ChannelId,
        update: &ChannelUpdate,
    ) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels"])?;
        let body = json!({ "id": id.get(), update.field(): update.value() });
        self.execute(self.http.put(url).json(&body))
    }

    fn delete_channel(&mut self, id: ChannelId) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels", &id.get().to_string()])?;
        self.execute(self.http.delete(url))
    }

    fn delete_channel_tag(&mut self, id: ChannelId) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels", &id.get().to_string(), "tag"])?;
        self.execute(self.http.delete(url))
    }

    fn delete_channels_batch(&mut self, ids: &[ChannelId]) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels", "batch"])?;
        self.execute(self.http.delete(url).json(&json!({ "ids": ids })))
    }

    fn test_channel(&mut self, id: ChannelId, model: &str) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels", "test", &id.get().to_string()])?;
        self.execute(self.http.get(url).query(&[("model", model)]))
    }

    fn test_all_channels(&mut self) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels", "test"])?;
        self.execute(self.http.get(url))
    }

    fn update_all_balances(&mut self) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channels", "update_balance"])?;
        self.execute(self.http.get(url))
    }

    fn delete_disabled_channels(&mut self) -> Result<Envelope<i64>> {
        let url = self.endpoint(&["channels", "disabled"])?;
        self.execute(self.http.delete(url))
    }

    fn delete_tag(&mut self, tag: &str) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channel_tag", tag])?;
        self.execute(self.http.delete(url))
    }

    fn update_tag_status(&mut self, tag: &str, status: i64) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channel_tag"])?;
        self.execute(
            self.http
                .put(url)
                .json(&json!({ "id": tag, "status": status })),
        )
    }

    fn update_tag_priority(&mut self, tag: &str, value: &str) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channel_tag", tag, "priority"])?;
        self.execute(
            self.http
                .put(url)
                .json(&json!({ "type": "priority", "value": value })),
        )
    }

    fn set_tag_status(&mut self, tag: &str, status: i64) -> Result<Envelope<Value>> {
        let url = self.endpoint(&["channel_tag", tag, "status", &status.to_string()])?;
        self.execute(self.http.put(url))
    }

    fn list_groups(&mut self) -> Result<Envelope<Vec<String>>> {
        let url = self.endpoint(&["groups"])?;
        self.execute(self.http.get(url))
    }

    fn list_tags(&mut self) -> Result<Envelope<Vec<Value>>> {
        let url = self.endpoint(&["channel_tags", "_all"])?;
        self.execute(self.http.get(url))
    }

    fn list_models(&mut self) -> Result<Envelope<Vec<ModelInfo>>> {
        let url = self.endpoint(&["channels", "models"])?;
        self.execute(self.http.get(url))
    }

    fn list_prices(&mut self) -> Result<Envelope<Vec<Value>>> {
        let url = self.endpoint(&["prices"])?;
        self.execute(self.http.get(url))
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- is the management server running? ({} )",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    message: Option<String>,
}
