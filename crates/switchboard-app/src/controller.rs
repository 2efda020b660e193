// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Drives the list state against a remote store: consumes queued fetch
//! requests, gates the bulk operations behind confirmation, and loads the
//! toolbar reference data.

use serde_json::Value;
use tracing::warn;

use crate::action::{ChannelAction, perform_action};
use crate::model::{ActionOutcome, ReferenceData, shape_model_options};
use crate::remote::{ChannelStore, Notifier};
use crate::state::{ListState, PendingAction};

pub const MSG_EMPTY_SELECTION: &str = "no channels selected";
pub const MSG_TESTS_STARTED: &str = "channel tests started";
pub const MSG_BALANCES_UPDATED: &str = "balance update finished";

/// Runs the queued fetch, if any. Returns whether a page was applied. A
/// failed read leaves the previous rows on screen: server rejections are
/// toasted, transport failures only logged.
pub fn run_fetch<S, N>(state: &mut ListState, store: &mut S, notifier: &mut N) -> bool
where
    S: ChannelStore,
    N: Notifier,
{
    let Some(query) = state.take_fetch_request() else {
        return false;
    };
    let result = store.list_channels(&query);
    state.finish_fetch();
    match result {
        Ok(envelope) => match (envelope.success, envelope.data) {
            (true, Some(page)) => {
                state.apply_page(page);
                true
            }
            (true, None) => {
                warn!("channel list reply was missing its page data");
                false
            }
            (false, _) => {
                notifier.error(&envelope.message);
                false
            }
        },
        Err(error) => {
            warn!(error = format!("{error:#}"), "channel list fetch failed");
            false
        }
    }
}

/// Parks a batch delete of the current selection behind the confirmation
/// gate. An empty selection is reported immediately and nothing is parked.
pub fn begin_batch_delete<N: Notifier>(state: &mut ListState, notifier: &mut N) -> bool {
    let ids = state.selected_ids();
    if ids.is_empty() {
        notifier.error(MSG_EMPTY_SELECTION);
        return false;
    }
    state.request_confirmation(PendingAction::Dispatch(ChannelAction::BatchDelete(ids)));
    true
}

/// Executes whatever is parked in the confirmation slot. Returns `None`
/// when the slot was empty.
pub fn confirm_pending<S, N>(
    state: &mut ListState,
    store: &mut S,
    notifier: &mut N,
) -> Option<ActionOutcome>
where
    S: ChannelStore,
    N: Notifier,
{
    let pending = state.take_confirmed()?;
    let outcome = match pending {
        PendingAction::Dispatch(ChannelAction::BatchDelete(ids)) => {
            let count = ids.len();
            let outcome = perform_action(state, store, notifier, ChannelAction::BatchDelete(ids));
            if outcome.success {
                state.clear_selection();
                notifier.success(&format!("deleted {count} channels"));
            }
            outcome
        }
        PendingAction::Dispatch(action) => perform_action(state, store, notifier, action),
        PendingAction::TestAll => test_all_channels(store, notifier),
        PendingAction::RefreshBalances => refresh_balances(state, store, notifier),
        PendingAction::PurgeDisabled => purge_disabled(state, store, notifier),
    };
    Some(outcome)
}

/// Kicks off a server-side test of every channel. Fire and forget: success
/// only acknowledges the start, a transport failure is silent.
pub fn test_all_channels<S, N>(store: &mut S, notifier: &mut N) -> ActionOutcome
where
    S: ChannelStore,
    N: Notifier,
{
    match store.test_all_channels() {
        Ok(envelope) => {
            if envelope.success {
                notifier.info(MSG_TESTS_STARTED);
            } else {
                notifier.error(&envelope.message);
            }
            ActionOutcome {
                success: envelope.success,
                message: envelope.message,
                data: envelope.data,
            }
        }
        Err(error) => {
            warn!(error = format!("{error:#}"), "test-all request failed");
            ActionOutcome {
                success: false,
                message: format!("{error:#}"),
                data: None,
            }
        }
    }
}

/// Refreshes every channel balance. The searching flag is held for the
/// duration so a manual search cannot race the long-running sweep.
pub fn refresh_balances<S, N>(state: &mut ListState, store: &mut S, notifier: &mut N) -> ActionOutcome
where
    S: ChannelStore,
    N: Notifier,
{
    state.set_searching(true);
    let result = store.update_all_balances();
    state.set_searching(false);
    match result {
        Ok(envelope) => {
            if envelope.success {
                notifier.info(MSG_BALANCES_UPDATED);
            } else {
                notifier.error(&envelope.message);
            }
            ActionOutcome {
                success: envelope.success,
                message: envelope.message,
                data: envelope.data,
            }
        }
        Err(error) => {
            warn!(error = format!("{error:#}"), "balance refresh failed");
            ActionOutcome {
                success: false,
                message: format!("{error:#}"),
                data: None,
            }
        }
    }
}

/// Deletes every disabled channel, reporting the server-side count and
/// refetching the current page on success.
pub fn purge_disabled<S, N>(state: &mut ListState, store: &mut S, notifier: &mut N) -> ActionOutcome
where
    S: ChannelStore,
    N: Notifier,
{
    match store.delete_disabled_channels() {
        Ok(envelope) => {
            if envelope.success {
                let count = envelope.data.unwrap_or(0);
                notifier.success(&format!("deleted {count} disabled channels"));
                state.queue_reload();
                ActionOutcome {
                    success: true,
                    message: envelope.message,
                    data: Some(Value::from(count)),
                }
            } else {
                notifier.error(&envelope.message);
                ActionOutcome {
                    success: false,
                    message: envelope.message,
                    data: None,
                }
            }
        }
        Err(error) => {
            warn!(error = format!("{error:#}"), "disabled purge failed");
            ActionOutcome {
                success: false,
                message: format!("{error:#}"),
                data: None,
            }
        }
    }
}

/// Loads the toolbar lookups. Each is independent and best effort; a failed
/// load leaves that list empty and the screen usable.
pub fn load_reference_data<S: ChannelStore>(store: &mut S) -> ReferenceData {
    let mut reference = ReferenceData::default();

    match store.list_groups() {
        Ok(envelope) if envelope.success => {
            reference.groups = envelope.data.unwrap_or_default();
        }
        Ok(envelope) => warn!(message = envelope.message, "group load failed"),
        Err(error) => warn!(error = format!("{error:#}"), "group load failed"),
    }

    match store.list_tags() {
        Ok(envelope) if envelope.success => {
            reference.tags = envelope.data.unwrap_or_default();
        }
        Ok(envelope) => warn!(message = envelope.message, "tag load failed"),
        Err(error) => warn!(error = format!("{error:#}"), "tag load failed"),
    }

    match store.list_models() {
        Ok(envelope) if envelope.success => {
            reference.models = shape_model_options(envelope.data.unwrap_or_default());
        }
        Ok(envelope) => warn!(message = envelope.message, "model load failed"),
        Err(error) => warn!(error = format!("{error:#}"), "model load failed"),
    }

    match store.list_prices() {
        Ok(envelope) if envelope.success => {
            reference.prices = envelope.data.unwrap_or_default();
        }
        Ok(envelope) => warn!(message = envelope.message, "price load failed"),
        Err(error) => warn!(error = format!("{error:#}"), "price load failed"),
    }

    reference
}
