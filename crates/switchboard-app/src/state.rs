// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;

use crate::action::ChannelAction;
use crate::ids::ChannelId;
use crate::model::{
    AppliedCriteria, ChannelPage, FilterCriteria, ListQuery, PAGE_SIZE_OPTIONS, PageSpec,
    SortDirection, SortSpec,
};

/// Destructive or bulk operation parked behind the confirmation gate.
/// Consumed and cleared atomically on confirm.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Dispatch(ChannelAction),
    TestAll,
    RefreshBalances,
    PurgeDisabled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListCommand {
    SetPage(u32),
    SetPageSize(u32),
    SortBy(String),
    CommitSearch,
    Reload { reset: bool },
    ToggleRow(ChannelId),
    ToggleSelectAll,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent {
    PageChanged(u32),
    PageSizeChanged(u32),
    SortChanged(SortSpec),
    CriteriaApplied { token: u64 },
    CriteriaReset,
    FetchQueued,
    SearchBlocked,
    SelectionChanged(usize),
}

/// Client state for the channel list screen: applied filter vs. draft,
/// sort, page, selection, and the in-flight flags. Every transition that
/// must cause a remote read queues an explicit fetch request; the driver
/// in `controller` consumes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListState {
    pub page: PageSpec,
    pub sort: SortSpec,
    pub draft: FilterCriteria,
    pub applied: AppliedCriteria,
    pub rows: Vec<crate::model::ChannelRow>,
    pub total_count: u64,
    pub selection: BTreeSet<ChannelId>,
    searching: bool,
    fetch_queued: bool,
    pending: Option<PendingAction>,
}

impl ListState {
    pub fn new(page_size: u32) -> Self {
        let size = if PAGE_SIZE_OPTIONS.contains(&page_size) {
            page_size
        } else {
            crate::model::DEFAULT_PAGE_SIZE
        };
        Self {
            page: PageSpec { index: 0, size },
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::SetPage(index) => {
                self.page.index = index;
                self.fetch_queued = true;
                vec![ListEvent::PageChanged(index), ListEvent::FetchQueued]
            }
            ListCommand::SetPageSize(size) => {
                if !PAGE_SIZE_OPTIONS.contains(&size) {
                    return vec![];
                }
                self.page.index = 0;
                self.page.size = size;
                self.fetch_queued = true;
                vec![
                    ListEvent::PageSizeChanged(size),
                    ListEvent::PageChanged(0),
                    ListEvent::FetchQueued,
                ]
            }
            ListCommand::SortBy(key) => self.sort_by(key),
            ListCommand::CommitSearch => self.commit_search(),
            ListCommand::Reload { reset } => self.reload(reset),
            ListCommand::ToggleRow(id) => {
                if !self.selection.remove(&id) {
                    self.selection.insert(id);
                }
                vec![ListEvent::SelectionChanged(self.selection.len())]
            }
            ListCommand::ToggleSelectAll => self.toggle_select_all(),
        }
    }

    /// Same key while ascending flips to descending; anything else sorts
    /// ascending by the new key. The empty key is ignored.
    fn sort_by(&mut self, key: String) -> Vec<ListEvent> {
        if key.is_empty() {
            return vec![];
        }
        let was_asc = self.sort.key == key && self.sort.direction == SortDirection::Asc;
        self.sort = SortSpec {
            key,
            direction: if was_asc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        };
        self.fetch_queued = true;
        vec![
            ListEvent::SortChanged(self.sort.clone()),
            ListEvent::FetchQueued,
        ]
    }

    /// Manual search commit. Blocked while a fetch is outstanding; the
    /// reactive triggers (page/size/sort/reload) are never blocked.
    fn commit_search(&mut self) -> Vec<ListEvent> {
        if self.searching {
            return vec![ListEvent::SearchBlocked];
        }
        self.page.index = 0;
        let token = self.applied.token + 1;
        self.applied = AppliedCriteria {
            criteria: self.draft.clone(),
            token,
        };
        self.fetch_queued = true;
        vec![
            ListEvent::PageChanged(0),
            ListEvent::CriteriaApplied { token },
            ListEvent::FetchQueued,
        ]
    }

    /// `reset` restores sort and both criteria instances to their defaults
    /// (the page index is left alone); either way exactly one fetch is
    /// queued even when no tracked field changed.
    fn reload(&mut self, reset: bool) -> Vec<ListEvent> {
        let mut events = Vec::new();
        if reset {
            self.sort = SortSpec::default();
            self.draft = FilterCriteria::default();
            self.applied = AppliedCriteria {
                criteria: FilterCriteria::default(),
                token: self.applied.token + 1,
            };
            events.push(ListEvent::SortChanged(self.sort.clone()));
            events.push(ListEvent::CriteriaReset);
        }
        self.fetch_queued = true;
        events.push(ListEvent::FetchQueued);
        events
    }

    /// Selects exactly the rendered ids, or clears the set when every
    /// rendered id is already selected. Not a cross-page select-all.
    fn toggle_select_all(&mut self) -> Vec<ListEvent> {
        let rendered: Vec<ChannelId> = self.rows.iter().map(|row| row.id).collect();
        if rendered.iter().all(|id| self.selection.contains(id)) {
            self.selection.clear();
        } else {
            self.selection = rendered.into_iter().collect();
        }
        vec![ListEvent::SelectionChanged(self.selection.len())]
    }

    pub fn selected_ids(&self) -> Vec<ChannelId> {
        self.selection.iter().copied().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Non-resetting reload under the current query state; used by the
    /// dispatcher after delete/copy/tag-delete/batch-delete.
    pub fn queue_reload(&mut self) {
        self.fetch_queued = true;
    }

    pub fn fetch_queued(&self) -> bool {
        self.fetch_queued
    }

    /// Consumes the queued fetch request and raises the loading flag.
    /// The caller must pair this with `finish_fetch`.
    pub fn take_fetch_request(&mut self) -> Option<ListQuery> {
        if !self.fetch_queued {
            return None;
        }
        self.fetch_queued = false;
        self.searching = true;
        Some(self.current_query())
    }

    pub fn finish_fetch(&mut self) {
        self.searching = false;
    }

    pub fn searching(&self) -> bool {
        self.searching
    }

    pub(crate) fn set_searching(&mut self, on: bool) {
        self.searching = on;
    }

    /// Wire parameters for the current query state. String criteria are
    /// trimmed; the submission token never leaves the client.
    pub fn current_query(&self) -> ListQuery {
        ListQuery {
            page: self.page.index + 1,
            size: self.page.size,
            order: self.sort.order_token(),
            criteria: self.applied.criteria.trimmed(),
        }
    }

    /// Writes the fetched rows and count. Last write wins; the selection
    /// set is deliberately left untouched.
    pub fn apply_page(&mut self, page: ChannelPage) {
        self.total_count = page.total_count;
        self.rows = page.rows;
    }

    pub fn request_confirmation(&mut self, action: PendingAction) {
        self.pending = Some(action);
    }

    pub fn pending_confirmation(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Consumes the pending action; the gate closes whether or not the
    /// caller goes on to execute it.
    pub fn take_confirmed(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    pub fn dismiss_confirmation(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{ListCommand, ListEvent, ListState, PendingAction};
    use crate::action::ChannelAction;
    use crate::ids::ChannelId;
    use crate::model::{ChannelPage, ChannelRow, FilterCriteria, SortDirection};
    use serde_json::Map;

    fn row(id: i64) -> ChannelRow {
        ChannelRow {
            id: ChannelId::new(id),
            name: format!("channel-{id}"),
            extra: Map::new(),
        }
    }

    fn state_with_rows(ids: &[i64]) -> ListState {
        let mut state = ListState::default();
        state.apply_page(ChannelPage {
            total_count: ids.len() as u64,
            rows: ids.iter().copied().map(row).collect(),
        });
        state
    }

    #[test]
    fn sort_toggles_between_directions_on_same_key() {
        let mut state = ListState::default();

        state.dispatch(ListCommand::SortBy("name".to_owned()));
        assert_eq!(state.sort.key, "name");
        assert_eq!(state.sort.direction, SortDirection::Asc);

        state.dispatch(ListCommand::SortBy("name".to_owned()));
        assert_eq!(state.sort.direction, SortDirection::Desc);

        state.dispatch(ListCommand::SortBy("name".to_owned()));
        assert_eq!(state.sort.direction, SortDirection::Asc);
    }

    #[test]
    fn sort_by_empty_key_is_a_no_op() {
        let mut state = ListState::default();
        let events = state.dispatch(ListCommand::SortBy(String::new()));
        assert!(events.is_empty());
        assert_eq!(state.sort.key, "id");
        assert!(!state.fetch_queued());
    }

    #[test]
    fn page_size_change_resets_index_and_rejects_foreign_sizes() {
        let mut state = ListState::default();
        state.dispatch(ListCommand::SetPage(3));
        assert_eq!(state.page.index, 3);

        state.dispatch(ListCommand::SetPageSize(25));
        assert_eq!(state.page.index, 0);
        assert_eq!(state.page.size, 25);

        let events = state.dispatch(ListCommand::SetPageSize(7));
        assert!(events.is_empty());
        assert_eq!(state.page.size, 25);
    }

    #[test]
    fn committing_identical_draft_twice_bumps_the_token_each_time() {
        let mut state = ListState::default();
        state.draft.name = "acme".to_owned();

        let first = state.dispatch(ListCommand::CommitSearch);
        assert!(first.contains(&ListEvent::CriteriaApplied { token: 1 }));
        state.take_fetch_request().expect("first fetch queued");
        state.finish_fetch();

        let second = state.dispatch(ListCommand::CommitSearch);
        assert!(second.contains(&ListEvent::CriteriaApplied { token: 2 }));
        assert_eq!(state.applied.criteria, state.draft);
    }

    #[test]
    fn commit_is_blocked_while_a_manual_search_is_outstanding() {
        let mut state = ListState::default();
        state.draft.name = "acme".to_owned();
        state.dispatch(ListCommand::CommitSearch);
        let query = state.take_fetch_request().expect("fetch queued");
        assert_eq!(query.criteria.name, "acme");
        assert!(state.searching());

        state.draft.name = "other".to_owned();
        let events = state.dispatch(ListCommand::CommitSearch);
        assert_eq!(events, vec![ListEvent::SearchBlocked]);
        assert_eq!(state.applied.criteria.name, "acme");
        assert!(state.take_fetch_request().is_none());
    }

    #[test]
    fn reactive_triggers_are_not_blocked_by_the_searching_flag() {
        let mut state = ListState::default();
        state.dispatch(ListCommand::CommitSearch);
        state.take_fetch_request().expect("fetch queued");

        let events = state.dispatch(ListCommand::SetPage(2));
        assert!(events.contains(&ListEvent::FetchQueued));
        assert!(state.take_fetch_request().is_some());
    }

    #[test]
    fn reset_reload_restores_sort_and_criteria_but_not_the_page() {
        let mut state = ListState::default();
        state.dispatch(ListCommand::SetPage(4));
        state.take_fetch_request();
        state.finish_fetch();
        state.dispatch(ListCommand::SortBy("name".to_owned()));
        state.take_fetch_request();
        state.finish_fetch();
        state.draft.name = "acme".to_owned();
        state.dispatch(ListCommand::CommitSearch);
        state.take_fetch_request();
        state.finish_fetch();

        // CommitSearch reset the index; page away again before resetting.
        state.dispatch(ListCommand::SetPage(4));
        state.take_fetch_request();
        state.finish_fetch();

        let events = state.dispatch(ListCommand::Reload { reset: true });
        assert!(events.contains(&ListEvent::CriteriaReset));
        assert!(events.contains(&ListEvent::FetchQueued));
        assert_eq!(state.sort.key, "id");
        assert_eq!(state.sort.direction, SortDirection::Desc);
        assert_eq!(state.draft, FilterCriteria::default());
        assert_eq!(state.applied.criteria, FilterCriteria::default());
        assert_eq!(state.page.index, 4);
    }

    #[test]
    fn plain_reload_queues_exactly_one_fetch_without_touching_state() {
        let mut state = ListState::default();
        state.draft.name = "acme".to_owned();
        state.dispatch(ListCommand::CommitSearch);
        state.take_fetch_request();
        state.finish_fetch();

        let events = state.dispatch(ListCommand::Reload { reset: false });
        assert_eq!(events, vec![ListEvent::FetchQueued]);
        assert_eq!(state.applied.criteria.name, "acme");
        assert!(state.take_fetch_request().is_some());
        assert!(state.take_fetch_request().is_none());
    }

    #[test]
    fn toggle_select_all_is_idempotent_paired() {
        let mut state = state_with_rows(&[1, 2, 3]);
        state.dispatch(ListCommand::ToggleRow(ChannelId::new(2)));
        let before = state.selection.clone();

        state.dispatch(ListCommand::ToggleSelectAll);
        assert_eq!(state.selection.len(), 3);
        state.dispatch(ListCommand::ToggleSelectAll);
        assert!(state.selection.is_empty());

        // A second pairing from the partial state also round-trips to empty,
        // not back to the partial set.
        state.selection = before;
        state.dispatch(ListCommand::ToggleSelectAll);
        state.dispatch(ListCommand::ToggleSelectAll);
        assert!(state.selection.is_empty());
    }

    #[test]
    fn row_toggle_is_symmetric() {
        let mut state = state_with_rows(&[1, 2]);
        state.dispatch(ListCommand::ToggleRow(ChannelId::new(1)));
        assert!(state.selection.contains(&ChannelId::new(1)));
        state.dispatch(ListCommand::ToggleRow(ChannelId::new(1)));
        assert!(state.selection.is_empty());
    }

    #[test]
    fn selection_survives_a_refetch_untouched() {
        let mut state = state_with_rows(&[1, 2, 3]);
        state.dispatch(ListCommand::ToggleSelectAll);
        state.apply_page(ChannelPage {
            total_count: 2,
            rows: vec![row(8), row(9)],
        });
        assert_eq!(state.selection.len(), 3);
    }

    #[test]
    fn wire_query_is_one_based_and_token_free() {
        let mut state = ListState::new(10);
        state.draft.name = " acme ".to_owned();
        state.dispatch(ListCommand::CommitSearch);

        let query = state.current_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.size, 10);
        assert_eq!(query.order, Some("-id".to_owned()));
        assert_eq!(query.criteria.name, "acme");
        assert!(
            query
                .query_pairs()
                .iter()
                .all(|(name, _)| !name.contains("token"))
        );
    }

    #[test]
    fn confirmation_gate_is_consumed_atomically() {
        let mut state = ListState::default();
        state.request_confirmation(PendingAction::Dispatch(ChannelAction::BatchDelete(vec![
            ChannelId::new(3),
        ])));
        assert!(state.pending_confirmation().is_some());

        let taken = state.take_confirmed().expect("pending action");
        assert!(matches!(taken, PendingAction::Dispatch(_)));
        assert!(state.take_confirmed().is_none());

        state.request_confirmation(PendingAction::TestAll);
        state.dismiss_confirmation();
        assert!(state.pending_confirmation().is_none());
    }

    #[test]
    fn new_state_falls_back_to_the_default_page_size() {
        assert_eq!(ListState::new(25).page.size, 25);
        assert_eq!(ListState::new(13).page.size, 10);
    }
}
