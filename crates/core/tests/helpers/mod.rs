//! Test harness for widget integration tests.
//!
//! Wraps an [`Autocomplete`] bound to a [`MemoryInput`] and a scripted lookup that records
//! every query it receives. Lookups can be slowed down per query to stage overlapping cycles.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roompick_core::{
    Autocomplete, Candidate, DropdownConfig, LookupReply, LookupSource, MemoryInput, Placement,
};

#[derive(Default)]
struct Script {
    replies: HashMap<String, (Duration, LookupReply)>,
    fallback: Option<LookupReply>,
    calls: Vec<String>,
}

/// A lookup whose replies are set up front.
#[derive(Clone, Default)]
pub struct ScriptedLookup {
    script: Arc<Mutex<Script>>,
}

impl ScriptedLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `query` with `reply` immediately.
    pub fn on(self, query: &str, reply: impl Into<LookupReply>) -> Self {
        self.on_after(query, Duration::ZERO, reply)
    }

    /// Reply to `query` with `reply` after `delay`.
    pub fn on_after(self, query: &str, delay: Duration, reply: impl Into<LookupReply>) -> Self {
        self.script.lock().unwrap().replies.insert(query.to_string(), (delay, reply.into()));
        self
    }

    /// Reply used for queries without a scripted answer.
    pub fn otherwise(self, reply: impl Into<LookupReply>) -> Self {
        self.script.lock().unwrap().fallback = Some(reply.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn source(&self) -> LookupSource {
        let script = Arc::clone(&self.script);
        LookupSource::from_fn(move |query: String| {
            let script = Arc::clone(&script);
            async move {
                let (delay, reply) = {
                    let mut s = script.lock().unwrap();
                    s.calls.push(query.clone());
                    match s.replies.get(&query) {
                        Some((delay, reply)) => (*delay, reply.clone()),
                        None => (
                            Duration::ZERO,
                            s.fallback.clone().unwrap_or(LookupReply::Candidates(Vec::new())),
                        ),
                    }
                };
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                reply
            }
        })
    }
}

pub struct TestHarness {
    pub widget: Autocomplete<MemoryInput>,
    pub lookup: ScriptedLookup,
}

impl TestHarness {
    pub fn new(lookup: ScriptedLookup) -> Self {
        Self::with_config(lookup, DropdownConfig::default())
    }

    pub fn with_config(lookup: ScriptedLookup, config: DropdownConfig) -> Self {
        let widget =
            Autocomplete::with_config(MemoryInput::new(), lookup.source(), Placement::Overlay, config);
        Self { widget, lookup }
    }

    /// Search without debounce and wait for the reply to be applied.
    pub async fn search_now(&self, query: &str) {
        self.widget.search(query, Duration::ZERO);
        self.widget.settle().await;
    }

    /// Type into the bound input and fire key-up.
    pub fn type_text(&self, text: &str) {
        self.widget.with_host(|host| host.text = text.to_string());
        self.widget.on_key_up();
    }
}

pub fn hotels(n: usize) -> Vec<Candidate> {
    (0..n).map(|i| Candidate::new(format!("Hotel {i}"), i.to_string())).collect()
}

pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
