// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Test doubles and deterministic fixtures for the channel list crates: a
//! scripted in-memory store, a recording notifier, and a seeded channel
//! faker.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value, json};
use switchboard_app::{
    ChannelDraft, ChannelId, ChannelPage, ChannelRow, ChannelStore, ChannelUpdate, Envelope,
    ListQuery, ModelInfo, Notifier, Severity,
};

const PROVIDERS: [&str; 8] = [
    "acme", "northwind", "globex", "initech", "contoso", "umbrella", "wayfarer", "fabrikam",
];

const MODEL_FAMILIES: [&str; 5] = ["alpha", "beta", "gamma", "delta", "sigma"];
const MODEL_SIZES: [&str; 4] = ["8b", "13b", "32b", "70b"];

const GROUPS: [&str; 4] = ["default", "vip", "internal", "edge"];
const TAGS: [&str; 5] = ["primary", "backup", "trial", "legacy", "canary"];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator for plausible channel rows. Same seed, same rows.
#[derive(Debug, Clone)]
pub struct ChannelFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl ChannelFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[self.rng.int_n(options.len())]
    }

    fn model_id(&mut self) -> String {
        format!("{}-{}", self.pick(&MODEL_FAMILIES), self.pick(&MODEL_SIZES))
    }

    pub fn channel(&mut self) -> ChannelRow {
        let id = self.next_id;
        self.next_id += 1;

        let provider = self.pick(&PROVIDERS);
        let mut extra = Map::new();
        extra.insert("type".to_owned(), json!(1 + self.rng.int_n(40) as i64));
        extra.insert("status".to_owned(), json!(1 + self.rng.int_n(2) as i64));
        extra.insert("priority".to_owned(), json!(self.rng.int_n(100) as i64));
        extra.insert("weight".to_owned(), json!(self.rng.int_n(10) as i64));
        extra.insert("group".to_owned(), json!(self.pick(&GROUPS)));
        extra.insert(
            "models".to_owned(),
            json!(format!("{},{}", self.model_id(), self.model_id())),
        );
        extra.insert(
            "response_time".to_owned(),
            json!(50 + self.rng.int_n(2_000) as i64),
        );
        extra.insert("used_quota".to_owned(), json!(self.rng.int_n(500_000) as i64));
        extra.insert(
            "test_time".to_owned(),
            json!(1_760_000_000 + self.rng.int_n(10_000_000) as i64),
        );
        extra.insert(
            "balance_updated_time".to_owned(),
            json!(1_760_000_000 + self.rng.int_n(10_000_000) as i64),
        );
        if self.rng.bool() {
            extra.insert("tag".to_owned(), json!(self.pick(&TAGS)));
        }

        ChannelRow {
            id: ChannelId::new(id),
            name: format!("{provider}-{id}"),
            extra,
        }
    }

    /// A page of `count` fresh rows claiming `total` matches overall.
    pub fn page(&mut self, count: usize, total: u64) -> ChannelPage {
        ChannelPage {
            total_count: total,
            rows: (0..count).map(|_| self.channel()).collect(),
        }
    }

    pub fn model_info(&mut self) -> ModelInfo {
        ModelInfo {
            id: self.model_id(),
            owned_by: self.pick(&PROVIDERS).to_owned(),
        }
    }
}

/// One scripted response: a successful envelope, a success with no data
/// payload, a server rejection, or a transport-level failure.
#[derive(Debug, Clone)]
pub enum ScriptedReply<T> {
    Ok(T),
    Empty,
    Fail(String),
    Transport(String),
}

impl<T> ScriptedReply<T> {
    fn resolve(self) -> Result<Envelope<T>> {
        match self {
            Self::Ok(data) => Ok(Envelope::ok(data)),
            Self::Empty => Ok(Envelope {
                success: true,
                message: String::new(),
                data: None,
            }),
            Self::Fail(message) => Ok(Envelope::failure(message)),
            Self::Transport(message) => Err(anyhow!(message)),
        }
    }
}

/// Every call a `ScriptedStore` has observed, in order, with the request
/// bodies it would have put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List(ListQuery),
    Get(ChannelId),
    Create(Value),
    Update { id: ChannelId, body: Value },
    Delete(ChannelId),
    DeleteChannelTag(ChannelId),
    BatchDelete(Vec<ChannelId>),
    Test { id: ChannelId, model: String },
    TestAll,
    UpdateBalances,
    PurgeDisabled,
    DeleteTag(String),
    UpdateTagStatus { tag: String, status: i64 },
    UpdateTagPriority { tag: String, value: String },
    SetTagStatus { tag: String, status: i64 },
    Groups,
    Tags,
    Models,
    Prices,
}

/// Scripted `ChannelStore`: replies are popped per call family, and every
/// call is recorded. An exhausted queue yields a benign default (an empty
/// success for writes, an empty page for reads) so tests only script what
/// they assert on.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    pub lists: VecDeque<ScriptedReply<ChannelPage>>,
    pub gets: VecDeque<ScriptedReply<ChannelRow>>,
    pub mutations: VecDeque<ScriptedReply<Value>>,
    pub disabled_counts: VecDeque<ScriptedReply<i64>>,
    pub groups: VecDeque<ScriptedReply<Vec<String>>>,
    pub tags: VecDeque<ScriptedReply<Vec<Value>>>,
    pub models: VecDeque<ScriptedReply<Vec<ModelInfo>>>,
    pub prices: VecDeque<ScriptedReply<Vec<Value>>>,
    pub calls: Vec<StoreCall>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_calls(&self) -> Vec<&ListQuery> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                StoreCall::List(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    fn mutation(&mut self, call: StoreCall) -> Result<Envelope<Value>> {
        self.calls.push(call);
        match self.mutations.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope {
                success: true,
                message: String::new(),
                data: None,
            }),
        }
    }
}

impl ChannelStore for ScriptedStore {
    fn list_channels(&mut self, query: &ListQuery) -> Result<Envelope<ChannelPage>> {
        self.calls.push(StoreCall::List(query.clone()));
        match self.lists.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::ok(ChannelPage {
                total_count: 0,
                rows: Vec::new(),
            })),
        }
    }

    fn get_channel(&mut self, id: ChannelId) -> Result<Envelope<ChannelRow>> {
        self.calls.push(StoreCall::Get(id));
        match self.gets.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::failure("channel not found")),
        }
    }

    fn create_channel(&mut self, draft: &ChannelDraft) -> Result<Envelope<Value>> {
        let body = serde_json::to_value(draft).context("encode channel draft")?;
        self.mutation(StoreCall::Create(body))
    }

    fn update_channel(
        &mut self,
        id: ChannelId,
        update: &ChannelUpdate,
    ) -> Result<Envelope<Value>> {
        let body = json!({ "id": id.get(), update.field(): update.value() });
        self.mutation(StoreCall::Update { id, body })
    }

    fn delete_channel(&mut self, id: ChannelId) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::Delete(id))
    }

    fn delete_channel_tag(&mut self, id: ChannelId) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::DeleteChannelTag(id))
    }

    fn delete_channels_batch(&mut self, ids: &[ChannelId]) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::BatchDelete(ids.to_vec()))
    }

    fn test_channel(&mut self, id: ChannelId, model: &str) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::Test {
            id,
            model: model.to_owned(),
        })
    }

    fn test_all_channels(&mut self) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::TestAll)
    }

    fn update_all_balances(&mut self) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::UpdateBalances)
    }

    fn delete_disabled_channels(&mut self) -> Result<Envelope<i64>> {
        self.calls.push(StoreCall::PurgeDisabled);
        match self.disabled_counts.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::ok(0)),
        }
    }

    fn delete_tag(&mut self, tag: &str) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::DeleteTag(tag.to_owned()))
    }

    fn update_tag_status(&mut self, tag: &str, status: i64) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::UpdateTagStatus {
            tag: tag.to_owned(),
            status,
        })
    }

    fn update_tag_priority(&mut self, tag: &str, value: &str) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::UpdateTagPriority {
            tag: tag.to_owned(),
            value: value.to_owned(),
        })
    }

    fn set_tag_status(&mut self, tag: &str, status: i64) -> Result<Envelope<Value>> {
        self.mutation(StoreCall::SetTagStatus {
            tag: tag.to_owned(),
            status,
        })
    }

    fn list_groups(&mut self) -> Result<Envelope<Vec<String>>> {
        self.calls.push(StoreCall::Groups);
        match self.groups.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::ok(Vec::new())),
        }
    }

    fn list_tags(&mut self) -> Result<Envelope<Vec<Value>>> {
        self.calls.push(StoreCall::Tags);
        match self.tags.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::ok(Vec::new())),
        }
    }

    fn list_models(&mut self) -> Result<Envelope<Vec<ModelInfo>>> {
        self.calls.push(StoreCall::Models);
        match self.models.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::ok(Vec::new())),
        }
    }

    fn list_prices(&mut self) -> Result<Envelope<Vec<Value>>> {
        self.calls.push(StoreCall::Prices);
        match self.prices.pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(Envelope::ok(Vec::new())),
        }
    }
}

/// Collects notifications instead of rendering them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notices: Vec<(Severity, String)>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|(recorded, _)| *recorded == severity)
            .map(|(_, message)| message.as_str())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, severity: Severity, message: &str) {
        self.notices.push((severity, message.to_owned()));
    }
}

pub fn temp_prefs_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let prefs_path = dir.path().join("switchboard.db");
    Ok((dir, prefs_path))
}

#[cfg(test)]
mod tests {
    use super::{ChannelFaker, RecordingNotifier, ScriptedReply, ScriptedStore, StoreCall};
    use switchboard_app::{ChannelId, ChannelStore, Notifier, Severity};

    #[test]
    fn faker_is_deterministic_per_seed() {
        let mut a = ChannelFaker::new(7);
        let mut b = ChannelFaker::new(7);
        assert_eq!(a.channel(), b.channel());
        assert_eq!(a.page(3, 9), b.page(3, 9));
    }

    #[test]
    fn faker_rows_carry_the_opaque_business_fields() {
        let row = ChannelFaker::new(1).channel();
        for field in ["type", "status", "priority", "weight", "group", "models"] {
            assert!(row.extra.contains_key(field), "{field} missing");
        }
    }

    #[test]
    fn scripted_store_records_calls_and_pops_replies_in_order() {
        let mut store = ScriptedStore::new();
        store
            .mutations
            .push_back(ScriptedReply::Fail("quota exceeded".to_owned()));

        let first = store.delete_channel(ChannelId::new(3)).expect("scripted");
        assert!(!first.success);
        assert_eq!(first.message, "quota exceeded");

        let second = store.delete_channel(ChannelId::new(4)).expect("default");
        assert!(second.success);

        assert_eq!(
            store.calls,
            vec![
                StoreCall::Delete(ChannelId::new(3)),
                StoreCall::Delete(ChannelId::new(4)),
            ]
        );
    }

    #[test]
    fn transport_replies_surface_as_errors() {
        let mut store = ScriptedStore::new();
        store
            .lists
            .push_back(ScriptedReply::Transport("connection refused".to_owned()));
        let result = store.list_channels(&switchboard_app::ListQuery {
            page: 1,
            size: 10,
            order: None,
            criteria: switchboard_app::FilterCriteria::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn recording_notifier_filters_by_severity() {
        let mut notifier = RecordingNotifier::new();
        notifier.success("saved");
        notifier.error("broke");
        assert_eq!(notifier.messages(Severity::Success), vec!["saved"]);
        assert_eq!(notifier.messages(Severity::Error), vec!["broke"]);
    }
}
