// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Terminal front end for the channel list controller: one process
//! invocation maps to one command against the list state.

use anyhow::{Context, Result, anyhow, bail};
use std::io::{self, Write};
use switchboard_app::{
    ActionOutcome, ActionTarget, ChannelAction, ChannelId, ChannelRow, ListCommand, ListState,
    Notifier, PendingAction, Severity, SortDirection, SortSpec, begin_batch_delete,
    confirm_pending, load_reference_data, perform_action, run_fetch,
};
use switchboard_prefs::PrefsStore;

pub struct TermNotifier;

impl Notifier for TermNotifier {
    fn notify(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => eprintln!("error: {message}"),
            Severity::Info | Severity::Success => println!("{message}"),
        }
    }
}

pub struct Console<'a, S: switchboard_app::ChannelStore> {
    state: ListState,
    store: S,
    prefs: &'a PrefsStore,
    notifier: TermNotifier,
    assume_yes: bool,
}

impl<'a, S: switchboard_app::ChannelStore> Console<'a, S> {
    pub fn new(store: S, prefs: &'a PrefsStore, assume_yes: bool) -> Result<Self> {
        let page_size = prefs.page_size(switchboard_app::CHANNEL_SCREEN)?;
        Ok(Self {
            state: ListState::new(page_size),
            store,
            prefs,
            notifier: TermNotifier,
            assume_yes,
        })
    }

    pub fn run(&mut self, command: &[String]) -> Result<()> {
        let Some((verb, rest)) = command.split_first() else {
            bail!("missing command; run with --help to see supported commands");
        };

        match verb.as_str() {
            "list" => self.list(rest),
            "copy" => {
                let id = parse_channel_id(rest.first())?;
                self.perform(ChannelAction::Copy(id))
            }
            "delete" => {
                let target = parse_target(rest.first())?;
                let prompt = match &target {
                    ActionTarget::Channel(id) => format!("delete channel {}?", id.get()),
                    ActionTarget::Tag(tag) => format!("delete every channel tagged {tag:?}?"),
                };
                self.confirm_and_run(
                    PendingAction::Dispatch(ChannelAction::Delete(target)),
                    &prompt,
                )
            }
            "delete-tag" => {
                let id = parse_channel_id(rest.first())?;
                self.confirm_and_run(
                    PendingAction::Dispatch(ChannelAction::DeleteTag(id)),
                    &format!("detach channel {} from its tag group?", id.get()),
                )
            }
            "status" => {
                let target = parse_target(rest.first())?;
                let status = parse_i64(rest.get(1), "status")?;
                self.perform(ChannelAction::SetStatus { target, status })
            }
            "priority" => {
                let target = parse_target(rest.first())?;
                let value = required_value(rest.get(1), "priority value")?;
                self.perform(ChannelAction::SetPriority { target, value })
            }
            "weight" => {
                let target = parse_target(rest.first())?;
                let value = required_value(rest.get(1), "weight value")?;
                self.perform(ChannelAction::SetWeight { target, value })
            }
            "test" => {
                let id = parse_channel_id(rest.first())?;
                let model = match rest.get(1).map(String::as_str) {
                    Some("--model") => rest
                        .get(2)
                        .cloned()
                        .ok_or_else(|| anyhow!("--model requires a model id"))?,
                    Some(other) => bail!("unknown test argument {other:?}"),
                    None => String::new(),
                };
                self.perform(ChannelAction::Test { id, model })
            }
            "tag-status" => {
                let tag = required_value(rest.first(), "tag")?;
                let status = parse_i64(rest.get(1), "status")?;
                self.perform(ChannelAction::TagStatus { tag, status })
            }
            "batch-delete" => self.batch_delete(rest),
            "lookups" => self.lookups(),
            "test-all" => self.confirm_and_run(
                PendingAction::TestAll,
                "run a connectivity test against every channel?",
            ),
            "update-balances" => self.confirm_and_run(
                PendingAction::RefreshBalances,
                "refresh the balance of every channel?",
            ),
            "purge-disabled" => self.confirm_and_run(
                PendingAction::PurgeDisabled,
                "delete every disabled channel?",
            ),
            unknown => bail!("unknown command {unknown:?}; run with --help"),
        }
    }

    fn list(&mut self, args: &[String]) -> Result<()> {
        let mut page: Option<u32> = None;
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--name" => self.state.draft.name = required_flag(&mut iter, "--name")?,
                "--group" => self.state.draft.group = required_flag(&mut iter, "--group")?,
                "--models" => self.state.draft.models = required_flag(&mut iter, "--models")?,
                "--key" => self.state.draft.key = required_flag(&mut iter, "--key")?,
                "--test-model" => {
                    self.state.draft.test_model = required_flag(&mut iter, "--test-model")?;
                }
                "--other" => self.state.draft.other = required_flag(&mut iter, "--other")?,
                "--tag" => self.state.draft.tag = required_flag(&mut iter, "--tag")?,
                "--type" => {
                    self.state.draft.channel_type =
                        parse_i64(Some(&required_flag(&mut iter, "--type")?), "--type")?;
                }
                "--status" => {
                    self.state.draft.status =
                        parse_i64(Some(&required_flag(&mut iter, "--status")?), "--status")?;
                }
                "--filter-tag" => {
                    self.state.draft.filter_tag = parse_i64(
                        Some(&required_flag(&mut iter, "--filter-tag")?),
                        "--filter-tag",
                    )?;
                }
                "--sort" => {
                    self.state.sort = parse_sort(&required_flag(&mut iter, "--sort")?);
                }
                "--page" => {
                    let wire: u32 = required_flag(&mut iter, "--page")?
                        .parse()
                        .context("--page expects a positive number")?;
                    if wire == 0 {
                        bail!("--page is 1-based; the first page is 1");
                    }
                    page = Some(wire - 1);
                }
                "--size" => {
                    let size: u32 = required_flag(&mut iter, "--size")?
                        .parse()
                        .context("--size expects a number")?;
                    self.prefs
                        .set_page_size(switchboard_app::CHANNEL_SCREEN, size)?;
                    self.state.dispatch(ListCommand::SetPageSize(size));
                }
                unknown => bail!("unknown list argument {unknown:?}"),
            }
        }

        self.state.dispatch(ListCommand::CommitSearch);
        if let Some(index) = page {
            self.state.page.index = index;
        }

        if !run_fetch(&mut self.state, &mut self.store, &mut self.notifier) {
            bail!("could not load channels");
        }
        self.print_rows();
        Ok(())
    }

    /// Prints the reference collections the server offers for filtering:
    /// groups, models (grouped by owner), tags, and the price count.
    fn lookups(&mut self) -> Result<()> {
        let reference = load_reference_data(&mut self.store);
        println!("groups ({}):", reference.groups.len());
        for group in &reference.groups {
            println!("  {group}");
        }
        println!("models ({}):", reference.models.len());
        for option in &reference.models {
            println!("  {:<32}  {}", option.id, option.group);
        }
        println!("tags ({}):", reference.tags.len());
        for tag in &reference.tags {
            println!("  {tag}");
        }
        println!("{} prices loaded", reference.prices.len());
        Ok(())
    }

    fn batch_delete(&mut self, args: &[String]) -> Result<()> {
        if args.is_empty() {
            bail!("batch-delete requires at least one channel id");
        }
        for arg in args {
            let id = parse_channel_id(Some(arg))?;
            self.state.dispatch(ListCommand::ToggleRow(id));
        }

        if !begin_batch_delete(&mut self.state, &mut self.notifier) {
            bail!("command failed");
        }
        let count = self.state.selected_ids().len();
        if !self.confirm(&format!("delete {count} channels?"))? {
            self.state.dismiss_confirmation();
            println!("aborted");
            return Ok(());
        }

        let outcome = confirm_pending(&mut self.state, &mut self.store, &mut self.notifier)
            .ok_or_else(|| anyhow!("no action pending confirmation"))?;
        self.finish(outcome)
    }

    fn confirm_and_run(&mut self, pending: PendingAction, prompt: &str) -> Result<()> {
        self.state.request_confirmation(pending);
        if !self.confirm(prompt)? {
            self.state.dismiss_confirmation();
            println!("aborted");
            return Ok(());
        }

        let outcome = confirm_pending(&mut self.state, &mut self.store, &mut self.notifier)
            .ok_or_else(|| anyhow!("no action pending confirmation"))?;
        self.finish(outcome)
    }

    fn perform(&mut self, action: ChannelAction) -> Result<()> {
        let outcome = perform_action(&mut self.state, &mut self.store, &mut self.notifier, action);
        self.finish(outcome)
    }

    /// Settles a finished action: destructive operations leave a reload
    /// queued, which is served before reporting the result.
    fn finish(&mut self, outcome: ActionOutcome) -> Result<()> {
        if self.state.fetch_queued() {
            run_fetch(&mut self.state, &mut self.store, &mut self.notifier);
        }
        if outcome.success {
            Ok(())
        } else if outcome.message.is_empty() {
            bail!("command failed")
        } else {
            bail!("{}", outcome.message)
        }
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        print!("{prompt} [y/N]: ");
        io::stdout().flush().context("flush confirmation prompt")?;
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("read confirmation")?;
        Ok(matches!(line.trim(), "y" | "Y" | "yes"))
    }

    fn print_rows(&self) {
        println!(
            "{:>6}  {:<24}  {:>4}  {:>6}  {:>8}  {:>6}  {}",
            "id", "name", "type", "status", "priority", "weight", "group"
        );
        for row in &self.state.rows {
            println!(
                "{:>6}  {:<24}  {:>4}  {:>6}  {:>8}  {:>6}  {}",
                row.id.get(),
                row.name,
                field_i64(row, "type"),
                field_i64(row, "status"),
                field_i64(row, "priority"),
                field_i64(row, "weight"),
                row.extra_str("group").unwrap_or(""),
            );
        }
        println!(
            "{} of {} channels (page {})",
            self.state.rows.len(),
            self.state.total_count,
            self.state.page.index + 1
        );
    }
}

fn field_i64(row: &ChannelRow, field: &str) -> String {
    row.extra_i64(field)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

/// `tag:NAME` addresses every channel under a tag; anything else is a
/// channel id.
fn parse_target(arg: Option<&String>) -> Result<ActionTarget> {
    let raw = arg.ok_or_else(|| anyhow!("missing target; pass a channel id or tag:NAME"))?;
    if let Some(tag) = raw.strip_prefix("tag:") {
        if tag.is_empty() {
            bail!("tag target must name a tag, got {raw:?}");
        }
        return Ok(ActionTarget::Tag(tag.to_owned()));
    }
    let id: i64 = raw
        .parse()
        .with_context(|| format!("invalid channel id {raw:?}"))?;
    Ok(ActionTarget::Channel(ChannelId::new(id)))
}

fn parse_channel_id(arg: Option<&String>) -> Result<ChannelId> {
    let raw = arg.ok_or_else(|| anyhow!("missing channel id"))?;
    let id: i64 = raw
        .parse()
        .with_context(|| format!("invalid channel id {raw:?}"))?;
    Ok(ChannelId::new(id))
}

fn parse_i64(arg: Option<&String>, what: &str) -> Result<i64> {
    let raw = arg.ok_or_else(|| anyhow!("missing {what}"))?;
    raw.parse()
        .with_context(|| format!("{what} expects a number, got {raw:?}"))
}

fn required_value(arg: Option<&String>, what: &str) -> Result<String> {
    arg.cloned().ok_or_else(|| anyhow!("missing {what}"))
}

fn required_flag<'i, I>(iter: &mut I, flag: &str) -> Result<String>
where
    I: Iterator<Item = &'i String>,
{
    iter.next()
        .cloned()
        .ok_or_else(|| anyhow!("{flag} requires a value"))
}

/// A leading `-` sorts descending, matching the wire order token.
fn parse_sort(raw: &str) -> SortSpec {
    match raw.strip_prefix('-') {
        Some(key) => SortSpec {
            key: key.to_owned(),
            direction: SortDirection::Desc,
        },
        None => SortSpec {
            key: raw.to_owned(),
            direction: SortDirection::Asc,
        },
    }
}
