//! The searchable dropdown state machine.
//!
//! [`SearchableDropdown`] holds no timers and performs no I/O. A host feeds it input events and
//! lookup replies and reads back a [`PopupView`]; [`crate::driver::Autocomplete`] does that on
//! tokio, the desktop app does it on the dioxus runtime.
//!
//! A cycle runs `request` → (lookup) → `apply`. `request` decides whether to debounce, skip a
//! repeated query or start a lookup; `apply` turns the reply into the visible list, an
//! auto-resolved selection, or nothing.

use std::time::Duration;

use tracing::{debug, warn};

use crate::host::InputHost;
use crate::lookup::LookupReply;
use crate::placement::{popup_style, Placement};
use crate::types::{
    Candidate, DropdownConfig, DropdownState, PopupRow, PopupView, RowContent, Selection,
};

/// What the caller must do after [`SearchableDropdown::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStep {
    /// Re-issue the request with a zero delay once `delay` has passed.
    Debounce { query: String, delay: Duration },
    /// Run the lookup and hand the reply to [`SearchableDropdown::apply`].
    Lookup(LookupTicket),
    /// Same query as last time; nothing to do.
    Unchanged,
}

/// Identifies one lookup cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub seq: u64,
    /// Normalised query to pass to the lookup.
    pub query: String,
}

/// Result of applying a lookup reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// A newer cycle started while this one was in flight; the reply was dropped.
    Stale,
    /// The reply was not a list; nothing changed.
    Rejected,
    /// No committable candidates; popup hidden.
    Empty,
    /// Exactly one candidate, committed without user action.
    AutoResolved(Selection),
    /// Popup shown with this many rows.
    Listed(usize),
}

/// Trim and lower-case a query the way lookups receive it.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

pub struct SearchableDropdown<H> {
    host: H,
    placement: Placement,
    config: DropdownConfig,
    last_query: String,
    seq: u64,
    items: Vec<Candidate>,
    popup: PopupView,
    state: DropdownState,
    /// State to fall back to when a debounced request turns out to repeat the last query.
    resume_state: DropdownState,
}

impl<H: std::fmt::Debug> std::fmt::Debug for SearchableDropdown<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchableDropdown")
            .field("host", &self.host)
            .field("placement", &self.placement)
            .field("last_query", &self.last_query)
            .field("seq", &self.seq)
            .field("items", &self.items.len())
            .field("state", &self.state)
            .finish()
    }
}

impl<H: InputHost> SearchableDropdown<H> {
    pub fn new(host: H, placement: Placement) -> Self {
        Self::with_config(host, placement, DropdownConfig::default())
    }

    pub fn with_config(host: H, placement: Placement, config: DropdownConfig) -> Self {
        Self {
            host,
            placement,
            config,
            last_query: String::new(),
            seq: 0,
            items: Vec::new(),
            popup: PopupView::default(),
            state: DropdownState::Idle,
            resume_state: DropdownState::Idle,
        }
    }

    // -----------------------------------------------------------------------
    // Search cycle
    // -----------------------------------------------------------------------

    /// Debounced search entry point. Cancelling any pending timer is the caller's job.
    pub fn request(&mut self, query: &str, delay: Duration) -> SearchStep {
        if !delay.is_zero() {
            if self.state != DropdownState::Debouncing {
                self.resume_state = self.state;
                self.state = DropdownState::Debouncing;
            }
            return SearchStep::Debounce { query: query.to_string(), delay };
        }

        let query = normalize_query(query);
        if query == self.last_query {
            if self.state == DropdownState::Debouncing {
                self.state = self.resume_state;
            }
            return SearchStep::Unchanged;
        }

        debug!(query = query.as_str(), "Searching");
        self.last_query = query.clone();
        self.host.set_state_value("");
        self.seq += 1;
        self.state = DropdownState::Fetching;
        SearchStep::Lookup(LookupTicket { seq: self.seq, query })
    }

    /// Feed a lookup reply back in. Everything after the await happens here, synchronously.
    pub fn apply(&mut self, ticket: &LookupTicket, reply: LookupReply) -> LookupOutcome {
        if self.config.discard_stale_responses && ticket.seq != self.seq {
            debug!(
                query = ticket.query.as_str(),
                seq = ticket.seq,
                latest = self.seq,
                "Dropping stale lookup reply"
            );
            return LookupOutcome::Stale;
        }

        let mut items = match reply {
            LookupReply::Candidates(items) => items,
            LookupReply::Error(message) => {
                warn!(query = ticket.query.as_str(), error = message.as_str(), "Lookup returned an error");
                self.settle_after_rejection();
                return LookupOutcome::Rejected;
            }
            LookupReply::Unexpected(payload) => {
                warn!(query = ticket.query.as_str(), payload = %payload, "Lookup returned a non-list reply");
                self.settle_after_rejection();
                return LookupOutcome::Rejected;
            }
        };
        items.truncate(self.config.limit);
        self.items = items;
        self.popup.rows.clear();

        match self.items.len() {
            0 => {
                self.hide();
                self.state = DropdownState::Empty;
                LookupOutcome::Empty
            }
            1 => {
                let only = self.items[0].clone();
                self.hide();
                match self.commit(&only) {
                    Some(selection) => {
                        self.state = DropdownState::AutoResolved;
                        LookupOutcome::AutoResolved(selection)
                    }
                    None => {
                        self.state = DropdownState::Empty;
                        LookupOutcome::Empty
                    }
                }
            }
            _ => {
                self.popup.rows = render_rows(&self.items);
                if self.popup.rows.is_empty() {
                    self.hide();
                    self.state = DropdownState::Empty;
                    return LookupOutcome::Empty;
                }
                self.show();
                self.state = DropdownState::Listed;
                LookupOutcome::Listed(self.popup.rows.len())
            }
        }
    }

    /// A hidden popup is no longer `Listed`, including the state a debounce would restore.
    fn leave_listed(&mut self) {
        if self.state == DropdownState::Listed {
            self.state = DropdownState::Idle;
        }
        if self.resume_state == DropdownState::Listed {
            self.resume_state = DropdownState::Idle;
        }
    }

    fn settle_after_rejection(&mut self) {
        self.state = if self.popup.visible { DropdownState::Listed } else { DropdownState::Idle };
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Write a candidate onto the bound input. Incomplete candidates are logged and ignored.
    pub fn commit(&mut self, candidate: &Candidate) -> Option<Selection> {
        let Some(selection) = candidate.selection() else {
            warn!(candidate = ?candidate, "Invalid candidate (expecting text and value)");
            return None;
        };
        self.host.set_display_value(&selection.display_text);
        self.host.set_state_value(&selection.value);
        Some(selection)
    }

    /// A click on the row showing `self.candidates()[index]`.
    pub fn select(&mut self, index: usize) -> Option<Selection> {
        let candidate = self.items.get(index)?.clone();
        let selection = self.commit(&candidate);
        self.hide();
        if selection.is_some() {
            self.state = DropdownState::Committed;
        }
        selection
    }

    /// Current `{displayText, value}` of the bound input.
    pub fn value(&self) -> Selection {
        Selection {
            display_text: self.host.display_value(),
            value: self.host.state_value(),
        }
    }

    // -----------------------------------------------------------------------
    // Visibility
    // -----------------------------------------------------------------------

    pub fn show(&mut self) {
        self.popup.style = popup_style(
            self.placement,
            &self.host.geometry(),
            self.host.viewport_height(),
            &self.config,
        );
        self.popup.visible = true;
    }

    pub fn hide(&mut self) {
        self.popup.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.popup.visible
    }

    // -----------------------------------------------------------------------
    // Input-binding events
    // -----------------------------------------------------------------------

    pub fn on_focus(&mut self) {
        if !self.popup.rows.is_empty() {
            self.show();
            if self.state == DropdownState::Idle {
                self.state = DropdownState::Listed;
            }
        }
    }

    /// Returns true when the caller should wait out the blur grace period and then call
    /// [`Self::on_blur_elapsed`].
    pub fn on_blur(&self) -> bool {
        self.is_visible()
    }

    pub fn on_blur_elapsed(&mut self) {
        if self.host.popup_has_focus() {
            return;
        }
        self.hide();
        self.leave_listed();
    }

    /// Key-up re-runs the search with the default debounce delay.
    pub fn on_key_up(&mut self) -> SearchStep {
        let text = self.host.display_value();
        self.request(&text, self.config.search_delay)
    }

    pub fn on_resize(&mut self) {
        self.hide();
        self.leave_listed();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn limit(&self) -> usize {
        self.config.limit
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.config.limit = limit;
    }

    pub fn search_delay(&self) -> Duration {
        self.config.search_delay
    }

    pub fn set_search_delay(&mut self, delay: Duration) {
        self.config.search_delay = delay;
    }

    pub fn config(&self) -> &DropdownConfig {
        &self.config
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.items
    }

    pub fn popup(&self) -> &PopupView {
        &self.popup
    }

    pub fn state(&self) -> DropdownState {
        self.state
    }

    pub fn last_query(&self) -> &str {
        &self.last_query
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

fn render_rows(items: &[Candidate]) -> Vec<PopupRow> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, c)| {
            let (Some(text), Some(value)) = (&c.display_text, &c.value) else {
                warn!(candidate = ?c, "Invalid candidate in list (expecting text and value)");
                return None;
            };
            let content = match c.rendered_html.as_deref() {
                Some(html) if !html.is_empty() => RowContent::Html(html.to_string()),
                _ => RowContent::Text(text.clone()),
            };
            Some(PopupRow { index, value: value.clone(), content })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryInput;
    use crate::placement::{InputGeometry, Rect};
    use serde_json::json;

    fn dropdown() -> SearchableDropdown<MemoryInput> {
        SearchableDropdown::new(MemoryInput::new(), Placement::Overlay)
    }

    fn start(dd: &mut SearchableDropdown<MemoryInput>, q: &str) -> LookupTicket {
        match dd.request(q, Duration::ZERO) {
            SearchStep::Lookup(ticket) => ticket,
            other => panic!("expected lookup, got {other:?}"),
        }
    }

    fn numbered(n: usize) -> Vec<Candidate> {
        (0..n).map(|i| Candidate::new(format!("Hotel {i}"), i.to_string())).collect()
    }

    #[test]
    fn query_is_normalised() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "  PaRis ");
        assert_eq!(ticket.query, "paris");
        assert_eq!(dd.state(), DropdownState::Fetching);
    }

    #[test]
    fn repeated_query_is_unchanged() {
        let mut dd = dropdown();
        start(&mut dd, "par");
        assert_eq!(dd.request("PAR ", Duration::ZERO), SearchStep::Unchanged);
    }

    #[test]
    fn initial_empty_query_is_unchanged() {
        let mut dd = dropdown();
        assert_eq!(dd.request("   ", Duration::ZERO), SearchStep::Unchanged);
    }

    #[test]
    fn positive_delay_debounces() {
        let mut dd = dropdown();
        let step = dd.request("par", Duration::from_millis(50));
        assert_eq!(
            step,
            SearchStep::Debounce { query: "par".into(), delay: Duration::from_millis(50) }
        );
        assert_eq!(dd.state(), DropdownState::Debouncing);
    }

    #[test]
    fn key_up_without_edit_keeps_listed_state() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        dd.host_mut().text = "hotel".into();

        let step = dd.on_key_up();
        let SearchStep::Debounce { query, .. } = step else {
            panic!("expected debounce, got {step:?}");
        };
        assert_eq!(dd.state(), DropdownState::Debouncing);
        assert_eq!(dd.request(&query, Duration::ZERO), SearchStep::Unchanged);
        assert_eq!(dd.state(), DropdownState::Listed);
        assert!(dd.is_visible());
    }

    #[test]
    fn resize_while_debouncing_does_not_restore_listed() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        dd.request("hotel", Duration::from_millis(50));
        dd.on_resize();
        assert_eq!(dd.request("hotel", Duration::ZERO), SearchStep::Unchanged);
        assert_eq!(dd.state(), DropdownState::Idle);
        assert!(!dd.is_visible());
    }

    #[test]
    fn retyping_same_query_keeps_committed_state() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        dd.select(1);
        assert_eq!(dd.state(), DropdownState::Committed);

        dd.request("hotel 1", Duration::from_millis(50));
        dd.request("hotel", Duration::from_millis(50));
        assert_eq!(dd.request("hotel", Duration::ZERO), SearchStep::Unchanged);
        assert_eq!(dd.state(), DropdownState::Committed);
    }

    #[test]
    fn new_cycle_clears_state_value() {
        let mut dd = dropdown();
        dd.host_mut().state = "17".into();
        start(&mut dd, "par");
        assert_eq!(dd.host().state, "");
    }

    #[test]
    fn reply_is_truncated_in_order() {
        let mut dd = dropdown();
        dd.set_limit(3);
        let ticket = start(&mut dd, "hotel");
        let outcome = dd.apply(&ticket, numbered(10).into());
        assert_eq!(outcome, LookupOutcome::Listed(3));
        let values: Vec<_> = dd.candidates().iter().map(|c| c.value.clone().unwrap()).collect();
        assert_eq!(values, ["0", "1", "2"]);
        assert!(dd.is_visible());
        assert_eq!(dd.state(), DropdownState::Listed);
    }

    #[test]
    fn single_candidate_auto_resolves() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "acme");
        let outcome = dd.apply(&ticket, vec![Candidate::new("Acme", "42")].into());
        let expected = Selection { display_text: "Acme".into(), value: "42".into() };
        assert_eq!(outcome, LookupOutcome::AutoResolved(expected.clone()));
        assert_eq!(dd.value(), expected);
        assert!(!dd.is_visible());
    }

    #[test]
    fn zero_candidates_hide_and_leave_value_empty() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "zzz");
        assert_eq!(dd.apply(&ticket, Vec::<Candidate>::new().into()), LookupOutcome::Empty);
        assert!(!dd.is_visible());
        assert!(dd.value().is_empty());
    }

    #[test]
    fn error_reply_keeps_previous_list() {
        let mut dd = dropdown();
        let first = start(&mut dd, "hotel");
        dd.apply(&first, numbered(4).into());
        let second = start(&mut dd, "hotel x");
        let outcome = dd.apply(&second, LookupReply::Error("db down".into()));
        assert_eq!(outcome, LookupOutcome::Rejected);
        assert_eq!(dd.candidates().len(), 4);
        assert!(dd.is_visible());
        assert_eq!(dd.state(), DropdownState::Listed);
    }

    #[test]
    fn unexpected_reply_is_rejected() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        let outcome = dd.apply(&ticket, LookupReply::Unexpected(json!({ "rows": 3 })));
        assert_eq!(outcome, LookupOutcome::Rejected);
        assert_eq!(dd.state(), DropdownState::Idle);
    }

    #[test]
    fn stale_reply_is_dropped() {
        let mut dd = dropdown();
        let old = start(&mut dd, "h");
        let new = start(&mut dd, "ho");
        assert_eq!(dd.apply(&new, numbered(2).into()), LookupOutcome::Listed(2));
        assert_eq!(dd.apply(&old, numbered(9).into()), LookupOutcome::Stale);
        assert_eq!(dd.candidates().len(), 2);
    }

    #[test]
    fn stale_reply_applies_without_guard() {
        let config = DropdownConfig { discard_stale_responses: false, ..DropdownConfig::default() };
        let mut dd = SearchableDropdown::with_config(MemoryInput::new(), Placement::Overlay, config);
        let old = start(&mut dd, "h");
        let new = start(&mut dd, "ho");
        dd.apply(&new, numbered(2).into());
        assert_eq!(dd.apply(&old, numbered(9).into()), LookupOutcome::Listed(9));
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "a");
        let reply = vec![
            Candidate::new("Alpha", "1"),
            Candidate { display_text: Some("Broken".into()), ..Candidate::default() },
            Candidate::new("Gamma", "3").with_html("<b>Gamma</b>"),
        ];
        assert_eq!(dd.apply(&ticket, reply.into()), LookupOutcome::Listed(2));
        let rows = &dd.popup().rows;
        assert_eq!(rows[0].content, RowContent::Text("Alpha".into()));
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].content, RowContent::Html("<b>Gamma</b>".into()));
    }

    #[test]
    fn malformed_single_candidate_is_not_committed() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "a");
        let reply = vec![Candidate { value: Some("1".into()), ..Candidate::default() }];
        assert_eq!(dd.apply(&ticket, reply.into()), LookupOutcome::Empty);
        assert!(dd.value().is_empty());
    }

    #[test]
    fn select_commits_and_hides() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        let selection = dd.select(1).unwrap();
        assert_eq!(selection.value, "1");
        assert_eq!(dd.host().text, "Hotel 1");
        assert_eq!(dd.host().state, "1");
        assert!(!dd.is_visible());
        assert_eq!(dd.state(), DropdownState::Committed);
    }

    #[test]
    fn focus_only_shows_with_rows() {
        let mut dd = dropdown();
        dd.on_focus();
        assert!(!dd.is_visible());
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        dd.hide();
        dd.on_focus();
        assert!(dd.is_visible());
    }

    #[test]
    fn blur_respects_popup_focus() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        assert!(dd.on_blur());
        dd.host_mut().popup_focused = true;
        dd.on_blur_elapsed();
        assert!(dd.is_visible());
        dd.host_mut().popup_focused = false;
        dd.on_blur_elapsed();
        assert!(!dd.is_visible());
        assert_eq!(dd.state(), DropdownState::Idle);
    }

    #[test]
    fn resize_hides() {
        let mut dd = dropdown();
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        dd.on_resize();
        assert!(!dd.is_visible());
    }

    #[test]
    fn focus_after_resize_uses_remeasured_geometry() {
        let mut dd = SearchableDropdown::new(MemoryInput::new(), Placement::InsertAfter);
        let ticket = start(&mut dd, "hotel");
        dd.apply(&ticket, numbered(3).into());
        dd.on_resize();
        assert!(!dd.is_visible());
        assert_eq!(dd.state(), DropdownState::Idle);

        dd.host_mut().geometry = InputGeometry::within(
            Rect::new(10.0, 60.0, 200.0, 30.0),
            Rect::new(10.0, 40.0, 200.0, 50.0),
        );
        dd.on_focus();
        assert!(dd.is_visible());
        assert_eq!(dd.popup().style.top, 50.0);
        assert_eq!(dd.popup().style.width, 200.0);
    }

    #[test]
    fn key_up_uses_display_text_and_default_delay() {
        let mut dd = SearchableDropdown::new(MemoryInput::with_text("Lon"), Placement::Overlay);
        assert_eq!(
            dd.on_key_up(),
            SearchStep::Debounce { query: "Lon".into(), delay: Duration::from_millis(50) }
        );
    }
}
