// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::ChannelId;

/// Page sizes the pagination widget offers; anything else is rejected on
/// write and coerced to the default on read.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Settings key under which this screen persists its page size.
pub const CHANNEL_SCREEN: &str = "channel";

pub const COPY_NAME_SUFFIX: &str = "_copy";

/// Derived/identity fields that must not travel into a duplicated channel.
/// `id` is excluded structurally by `ChannelDraft`.
pub const COPY_STRIPPED_FIELDS: [&str; 4] = [
    "test_time",
    "balance_updated_time",
    "used_quota",
    "response_time",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: "id".to_owned(),
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Signed order token for the wire: `-key` descending, `key` ascending,
    /// absent when no key is set.
    pub fn order_token(&self) -> Option<String> {
        if self.key.is_empty() {
            return None;
        }
        match self.direction {
            SortDirection::Asc => Some(self.key.clone()),
            SortDirection::Desc => Some(format!("-{}", self.key)),
        }
    }
}

/// 0-based page index; the wire is 1-based (see `ListQuery`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    pub index: u32,
    pub size: u32,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Filter fields the operator can set. Empty/zero fields are transmitted
/// as-is; filtering semantics belong to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(rename = "type")]
    pub channel_type: i64,
    pub status: i64,
    pub name: String,
    pub group: String,
    pub models: String,
    pub key: String,
    pub test_model: String,
    pub other: String,
    pub filter_tag: i64,
    pub tag: String,
}

impl FilterCriteria {
    /// Whitespace-trimmed copy used when building the wire request.
    pub fn trimmed(&self) -> Self {
        Self {
            channel_type: self.channel_type,
            status: self.status,
            name: self.name.trim().to_owned(),
            group: self.group.trim().to_owned(),
            models: self.models.trim().to_owned(),
            key: self.key.trim().to_owned(),
            test_model: self.test_model.trim().to_owned(),
            other: self.other.trim().to_owned(),
            filter_tag: self.filter_tag,
            tag: self.tag.trim().to_owned(),
        }
    }
}

/// Snapshot of the draft at commit time. The token is bumped on every
/// commit so resubmitting identical field values still triggers a fetch;
/// it never reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppliedCriteria {
    pub criteria: FilterCriteria,
    pub token: u64,
}

/// Parameters for one remote list read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based wire page.
    pub page: u32,
    pub size: u32,
    pub order: Option<String>,
    pub criteria: FilterCriteria,
}

impl ListQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some(order) = &self.order {
            pairs.push(("order", order.clone()));
        }
        pairs.push(("type", self.criteria.channel_type.to_string()));
        pairs.push(("status", self.criteria.status.to_string()));
        pairs.push(("name", self.criteria.name.clone()));
        pairs.push(("group", self.criteria.group.clone()));
        pairs.push(("models", self.criteria.models.clone()));
        pairs.push(("key", self.criteria.key.clone()));
        pairs.push(("test_model", self.criteria.test_model.clone()));
        pairs.push(("other", self.criteria.other.clone()));
        pairs.push(("filter_tag", self.criteria.filter_tag.to_string()));
        pairs.push(("tag", self.criteria.tag.clone()));
        pairs
    }
}

/// One channel record. The controller only interprets `id` and `name`;
/// every other business field rides along opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRow {
    pub id: ChannelId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChannelRow {
    pub fn extra_str(&self, field: &str) -> Option<&str> {
        self.extra.get(field).and_then(Value::as_str)
    }

    pub fn extra_i64(&self, field: &str) -> Option<i64> {
        self.extra.get(field).and_then(Value::as_i64)
    }

    /// Body for duplicating this channel: identity/derived fields removed,
    /// copy suffix appended to the name.
    pub fn copy_source(&self) -> ChannelDraft {
        let mut extra = self.extra.clone();
        for field in COPY_STRIPPED_FIELDS {
            extra.remove(field);
        }
        ChannelDraft {
            name: format!("{}{COPY_NAME_SUFFIX}", self.name),
            extra,
        }
    }
}

/// Create-request body: a channel without an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDraft {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPage {
    pub total_count: u64,
    #[serde(rename = "data")]
    pub rows: Vec<ChannelRow>,
}

/// Response envelope every remote call returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Uniform dispatcher return, regardless of which remote operation ran.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl ActionOutcome {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub owned_by: String,
}

/// Model picker entry: owner becomes the option group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelOption {
    pub id: String,
    pub group: String,
}

pub fn shape_model_options(mut models: Vec<ModelInfo>) -> Vec<ModelOption> {
    models.sort_by(|a, b| a.owned_by.cmp(&b.owned_by).then_with(|| a.id.cmp(&b.id)));
    models
        .into_iter()
        .map(|model| ModelOption {
            id: model.id,
            group: model.owned_by,
        })
        .collect()
}

/// Mount-time lookups for the toolbar; all loads are best-effort.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceData {
    pub groups: Vec<String>,
    pub tags: Vec<Value>,
    pub models: Vec<ModelOption>,
    pub prices: Vec<Value>,
}
