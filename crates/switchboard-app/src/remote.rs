// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde_json::Value;

use crate::ids::ChannelId;
use crate::model::{
    ChannelDraft, ChannelPage, ChannelRow, Envelope, ListQuery, ModelInfo, Severity,
};

/// General update body for `PUT /channels`; the store injects the target id.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelUpdate {
    Status(i64),
    Priority(serde_json::Number),
    Weight(serde_json::Number),
}

impl ChannelUpdate {
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Priority(_) => "priority",
            Self::Weight(_) => "weight",
        }
    }

    pub fn value(&self) -> Value {
        match self {
            Self::Status(status) => Value::from(*status),
            Self::Priority(number) | Self::Weight(number) => Value::Number(number.clone()),
        }
    }
}

/// The remote collection store. `Err` means the transport itself failed;
/// a completed call that the server rejected comes back as a `success:false`
/// envelope.
pub trait ChannelStore {
    fn list_channels(&mut self, query: &ListQuery) -> Result<Envelope<ChannelPage>>;
    fn get_channel(&mut self, id: ChannelId) -> Result<Envelope<ChannelRow>>;
    fn create_channel(&mut self, draft: &ChannelDraft) -> Result<Envelope<Value>>;
    fn update_channel(&mut self, id: ChannelId, update: &ChannelUpdate)
    -> Result<Envelope<Value>>;
    fn delete_channel(&mut self, id: ChannelId) -> Result<Envelope<Value>>;
    fn delete_channel_tag(&mut self, id: ChannelId) -> Result<Envelope<Value>>;
    fn delete_channels_batch(&mut self, ids: &[ChannelId]) -> Result<Envelope<Value>>;
    fn test_channel(&mut self, id: ChannelId, model: &str) -> Result<Envelope<Value>>;
    fn test_all_channels(&mut self) -> Result<Envelope<Value>>;
    fn update_all_balances(&mut self) -> Result<Envelope<Value>>;
    fn delete_disabled_channels(&mut self) -> Result<Envelope<i64>>;

    fn delete_tag(&mut self, tag: &str) -> Result<Envelope<Value>>;
    fn update_tag_status(&mut self, tag: &str, status: i64) -> Result<Envelope<Value>>;
    fn update_tag_priority(&mut self, tag: &str, value: &str) -> Result<Envelope<Value>>;
    fn set_tag_status(&mut self, tag: &str, status: i64) -> Result<Envelope<Value>>;

    fn list_groups(&mut self) -> Result<Envelope<Vec<String>>>;
    fn list_tags(&mut self) -> Result<Envelope<Vec<Value>>>;
    fn list_models(&mut self) -> Result<Envelope<Vec<ModelInfo>>>;
    fn list_prices(&mut self) -> Result<Envelope<Vec<Value>>>;
}

/// One-line operator notifications; wording and localization live with the
/// implementor.
pub trait Notifier {
    fn notify(&mut self, severity: Severity, message: &str);

    fn info(&mut self, message: &str) {
        self.notify(Severity::Info, message);
    }

    fn success(&mut self, message: &str) {
        self.notify(Severity::Success, message);
    }

    fn error(&mut self, message: &str) {
        self.notify(Severity::Error, message);
    }
}
