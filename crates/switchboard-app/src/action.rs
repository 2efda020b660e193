// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Number, Value};

use crate::ids::ChannelId;
use crate::model::{ActionOutcome, Envelope};
use crate::remote::{ChannelStore, ChannelUpdate, Notifier};
use crate::state::ListState;

pub const MSG_EMPTY_VALUE: &str = "value must not be empty";
pub const MSG_NOT_A_NUMBER: &str = "value must be a number";
pub const MSG_OPERATION_OK: &str = "operation completed";

/// Row actions target a single channel; a handful also come in a tag-wide
/// variant that fans out server-side.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget {
    Channel(ChannelId),
    Tag(String),
}

/// Everything the list screen can do to the collection, one variant per
/// operation. Unknown actions are unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    Copy(ChannelId),
    Delete(ActionTarget),
    /// Detach a single channel from its tag group.
    DeleteTag(ChannelId),
    SetStatus { target: ActionTarget, status: i64 },
    SetPriority { target: ActionTarget, value: String },
    SetWeight { target: ActionTarget, value: String },
    Test { id: ChannelId, model: String },
    BatchDelete(Vec<ChannelId>),
    /// Enable or disable every channel carrying the tag.
    TagStatus { tag: String, status: i64 },
}

impl ChannelAction {
    /// Actions that change the visible set of rows; the dispatcher queues a
    /// non-resetting reload after these succeed. In-place edits do not
    /// refetch.
    pub fn reloads_after_success(&self) -> bool {
        matches!(
            self,
            Self::Copy(_) | Self::Delete(_) | Self::DeleteTag(_) | Self::BatchDelete(_)
        )
    }
}

/// Channel-scope priority/weight values travel as numbers; integers stay
/// integers on the wire.
fn parse_wire_number(value: &str) -> Option<Number> {
    if let Ok(int) = value.parse::<i64>() {
        return Some(Number::from(int));
    }
    value.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Runs one action against the store and reports a uniform outcome. A
/// transport failure becomes a failed outcome carrying the error text; it is
/// never propagated and never toasted here. Server rejections are toasted
/// with the server's message.
pub fn perform_action<S, N>(
    state: &mut ListState,
    store: &mut S,
    notifier: &mut N,
    action: ChannelAction,
) -> ActionOutcome
where
    S: ChannelStore,
    N: Notifier,
{
    // Value guards fire before any remote call and without a notification.
    match &action {
        ChannelAction::SetPriority { value, .. } | ChannelAction::SetWeight { value, .. }
            if value.is_empty() =>
        {
            return ActionOutcome::rejected(MSG_EMPTY_VALUE);
        }
        _ => {}
    }

    let result = match &action {
        ChannelAction::Copy(id) => return perform_copy(state, store, notifier, *id),
        ChannelAction::Delete(ActionTarget::Channel(id)) => store.delete_channel(*id),
        ChannelAction::Delete(ActionTarget::Tag(tag)) => store.delete_tag(tag),
        ChannelAction::DeleteTag(id) => store.delete_channel_tag(*id),
        ChannelAction::SetStatus {
            target: ActionTarget::Channel(id),
            status,
        } => store.update_channel(*id, &ChannelUpdate::Status(*status)),
        ChannelAction::SetStatus {
            target: ActionTarget::Tag(tag),
            status,
        } => store.update_tag_status(tag, *status),
        ChannelAction::SetPriority {
            target: ActionTarget::Channel(id),
            value,
        } => match parse_wire_number(value) {
            Some(number) => store.update_channel(*id, &ChannelUpdate::Priority(number)),
            None => return ActionOutcome::rejected(MSG_NOT_A_NUMBER),
        },
        ChannelAction::SetWeight {
            target: ActionTarget::Channel(id),
            value,
        } => match parse_wire_number(value) {
            Some(number) => store.update_channel(*id, &ChannelUpdate::Weight(number)),
            None => return ActionOutcome::rejected(MSG_NOT_A_NUMBER),
        },
        // Tag-wide priority and weight share one endpoint; the value rides
        // through verbatim.
        ChannelAction::SetPriority {
            target: ActionTarget::Tag(tag),
            value,
        }
        | ChannelAction::SetWeight {
            target: ActionTarget::Tag(tag),
            value,
        } => store.update_tag_priority(tag, value),
        ChannelAction::Test { id, model } => store.test_channel(*id, model),
        ChannelAction::BatchDelete(ids) => store.delete_channels_batch(ids),
        ChannelAction::TagStatus { tag, status } => store.set_tag_status(tag, *status),
    };

    settle(state, notifier, &action, result)
}

/// Copy is the one two-step action: read the source row, then create the
/// stripped duplicate under a `_copy` name.
fn perform_copy<S, N>(
    state: &mut ListState,
    store: &mut S,
    notifier: &mut N,
    id: ChannelId,
) -> ActionOutcome
where
    S: ChannelStore,
    N: Notifier,
{
    let source = match store.get_channel(id) {
        Ok(envelope) => {
            if !envelope.success {
                notifier.error(&envelope.message);
                return ActionOutcome {
                    success: false,
                    message: envelope.message,
                    data: None,
                };
            }
            match envelope.data {
                Some(row) => row,
                None => {
                    notifier.error(&envelope.message);
                    return ActionOutcome {
                        success: false,
                        message: envelope.message,
                        data: None,
                    };
                }
            }
        }
        Err(error) => {
            return ActionOutcome {
                success: false,
                message: format!("{error:#}"),
                data: None,
            };
        }
    };

    let result = store.create_channel(&source.copy_source());
    settle(state, notifier, &ChannelAction::Copy(id), result)
}

fn settle<N: Notifier>(
    state: &mut ListState,
    notifier: &mut N,
    action: &ChannelAction,
    result: anyhow::Result<Envelope<Value>>,
) -> ActionOutcome {
    match result {
        Ok(envelope) => {
            if envelope.success {
                // Batch delete reports its own count-specific notice at the
                // confirmation layer.
                if !matches!(action, ChannelAction::BatchDelete(_)) {
                    notifier.success(MSG_OPERATION_OK);
                }
                if action.reloads_after_success() {
                    state.queue_reload();
                }
            } else {
                notifier.error(&envelope.message);
            }
            ActionOutcome {
                success: envelope.success,
                message: envelope.message,
                data: envelope.data,
            }
        }
        Err(error) => ActionOutcome {
            success: false,
            message: format!("{error:#}"),
            data: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::parse_wire_number;
    use serde_json::json;

    #[test]
    fn integers_stay_integers_on_the_wire() {
        let number = parse_wire_number("30").expect("integer parses");
        assert_eq!(json!(number), json!(30));
    }

    #[test]
    fn decimals_parse_as_floats() {
        let number = parse_wire_number("2.5").expect("decimal parses");
        assert_eq!(json!(number), json!(2.5));
    }

    #[test]
    fn garbage_and_non_finite_values_are_rejected() {
        assert!(parse_wire_number("abc").is_none());
        assert!(parse_wire_number("1e999").is_none());
        assert!(parse_wire_number("").is_none());
    }
}
