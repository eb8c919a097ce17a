//! Tokio driver for [`SearchableDropdown`].
//!
//! [`Autocomplete`] is the ready-to-use widget: it owns the state machine behind a mutex, the
//! lookup source, and two [`Debouncer`]s (search and blur grace). Lookups run as spawned tasks;
//! the mutex is never held across an await, so each reply is applied in one synchronous step.
//!
//! Every method that may arm a timer or start a lookup must be called inside a tokio runtime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::debug;

use crate::debounce::Debouncer;
use crate::dropdown::{LookupTicket, SearchStep, SearchableDropdown};
use crate::host::InputHost;
use crate::lookup::LookupSource;
use crate::placement::Placement;
use crate::types::{Candidate, DropdownConfig, DropdownState, PopupView, Selection};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Counts lookups that have started but not yet been applied.
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

struct InFlightGuard(Arc<InFlight>);

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

pub struct Autocomplete<H> {
    dropdown: Arc<Mutex<SearchableDropdown<H>>>,
    source: LookupSource,
    debounce: Arc<Mutex<Debouncer>>,
    blur: Arc<Mutex<Debouncer>>,
    inflight: Arc<InFlight>,
}

impl<H> Clone for Autocomplete<H> {
    fn clone(&self) -> Self {
        Self {
            dropdown: Arc::clone(&self.dropdown),
            source: self.source.clone(),
            debounce: Arc::clone(&self.debounce),
            blur: Arc::clone(&self.blur),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<H> std::fmt::Debug for Autocomplete<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autocomplete")
            .field("source", &self.source)
            .field("inflight", &self.inflight.count.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<H: InputHost + Send + 'static> Autocomplete<H> {
    pub fn new(host: H, source: LookupSource, placement: Placement) -> Self {
        Self::with_config(host, source, placement, DropdownConfig::default())
    }

    pub fn with_config(
        host: H,
        source: LookupSource,
        placement: Placement,
        config: DropdownConfig,
    ) -> Self {
        Self {
            dropdown: Arc::new(Mutex::new(SearchableDropdown::with_config(host, placement, config))),
            source,
            debounce: Arc::new(Mutex::new(Debouncer::new())),
            blur: Arc::new(Mutex::new(Debouncer::new())),
            inflight: Arc::new(InFlight::default()),
        }
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Debounced search. With a positive `delay` this arms a timer and returns; otherwise it
    /// starts a lookup unless the normalised query equals the previous one.
    pub fn search(&self, query: &str, delay: Duration) {
        let mut debounce = lock(&self.debounce);
        self.search_locked(&mut debounce, query, delay);
    }

    fn search_locked(&self, debounce: &mut Debouncer, query: &str, delay: Duration) {
        debounce.cancel();
        let step = lock(&self.dropdown).request(query, delay);
        match step {
            SearchStep::Debounce { query, delay } => {
                let this = self.clone();
                debounce.schedule(delay, move |generation| async move {
                    this.fire(generation, &query);
                });
            }
            SearchStep::Lookup(ticket) => self.spawn_lookup(ticket),
            SearchStep::Unchanged => {}
        }
    }

    fn fire(&self, generation: u64, query: &str) {
        let mut debounce = lock(&self.debounce);
        if debounce.complete(generation) {
            self.search_locked(&mut debounce, query, Duration::ZERO);
        }
    }

    fn spawn_lookup(&self, ticket: LookupTicket) {
        let dropdown = Arc::clone(&self.dropdown);
        let source = self.source.clone();
        let guard = self.inflight.enter();
        tokio::spawn(async move {
            let _guard = guard;
            let reply = source.lookup(&ticket.query).await;
            let outcome = lock(&dropdown).apply(&ticket, reply);
            debug!(query = ticket.query.as_str(), outcome = ?outcome, "Lookup applied");
        });
    }

    /// Wait until every lookup started so far has been applied. Pending debounce timers are
    /// not waited for.
    pub async fn settle(&self) {
        loop {
            let notified = self.inflight.idle.notified();
            if self.inflight.count.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// True while a debounce timer is armed.
    pub fn is_debouncing(&self) -> bool {
        lock(&self.debounce).is_pending()
    }

    // -----------------------------------------------------------------------
    // Input-binding events
    // -----------------------------------------------------------------------

    pub fn on_key_up(&self) {
        let (text, delay) = {
            let dropdown = lock(&self.dropdown);
            (dropdown.host().display_value(), dropdown.search_delay())
        };
        self.search(&text, delay);
    }

    pub fn on_focus(&self) {
        lock(&self.dropdown).on_focus();
    }

    /// Hide after the grace period unless focus landed on the popup.
    pub fn on_blur(&self) {
        let grace = {
            let dropdown = lock(&self.dropdown);
            if !dropdown.on_blur() {
                return;
            }
            dropdown.config().blur_grace
        };
        let dropdown = Arc::clone(&self.dropdown);
        let blur = Arc::clone(&self.blur);
        lock(&self.blur).schedule(grace, move |generation| async move {
            if lock(&blur).complete(generation) {
                lock(&dropdown).on_blur_elapsed();
            }
        });
    }

    pub fn on_resize(&self) {
        lock(&self.dropdown).on_resize();
    }

    /// A click on a popup row.
    pub fn select(&self, index: usize) -> Option<Selection> {
        lock(&self.dropdown).select(index)
    }

    pub fn commit(&self, candidate: &Candidate) -> Option<Selection> {
        lock(&self.dropdown).commit(candidate)
    }

    pub fn show(&self) {
        lock(&self.dropdown).show();
    }

    pub fn hide(&self) {
        lock(&self.dropdown).hide();
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn value(&self) -> Selection {
        lock(&self.dropdown).value()
    }

    pub fn popup(&self) -> PopupView {
        lock(&self.dropdown).popup().clone()
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.dropdown).is_visible()
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        lock(&self.dropdown).candidates().to_vec()
    }

    pub fn state(&self) -> DropdownState {
        lock(&self.dropdown).state()
    }

    pub fn limit(&self) -> usize {
        lock(&self.dropdown).limit()
    }

    pub fn set_limit(&self, limit: usize) {
        lock(&self.dropdown).set_limit(limit);
    }

    pub fn search_delay(&self) -> Duration {
        lock(&self.dropdown).search_delay()
    }

    pub fn set_search_delay(&self, delay: Duration) {
        lock(&self.dropdown).set_search_delay(delay);
    }

    /// Run `f` against the bound input, e.g. to simulate typing.
    pub fn with_host<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(lock(&self.dropdown).host_mut())
    }
}
