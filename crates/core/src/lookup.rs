//! Lookup sources: where candidates come from.
//!
//! A source is either a static candidate list, filtered locally by case-insensitive substring
//! match, or anything implementing [`Lookup`] (async closures, the REST client in
//! [`crate::rest`]). Replies are data: an error payload or an unexpected JSON value is reported
//! as a [`LookupReply`] variant and never raised.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

use crate::error::{DropdownError, Result};
use crate::types::Candidate;

/// What a lookup resolved with.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupReply {
    /// A candidate list, in the order the source ranked it.
    Candidates(Vec<Candidate>),
    /// An error-shaped payload (`{"error": "..."}`) or a transport failure.
    Error(String),
    /// Anything else that is not a list.
    Unexpected(Value),
}

impl LookupReply {
    /// Interpret a decoded JSON body the way the REST backend shapes its replies.
    ///
    /// Array elements that are not objects are dropped with a warning; objects missing
    /// `text` or `value` are kept so the widget can skip them when rendering.
    pub fn from_json(body: Value) -> Self {
        match body {
            Value::Array(items) => LookupReply::Candidates(
                items
                    .into_iter()
                    .filter_map(|item| match serde_json::from_value::<Candidate>(item.clone()) {
                        Ok(c) => Some(c),
                        Err(e) => {
                            warn!(item = %item, error = %e, "Dropping non-object entry from lookup reply");
                            None
                        }
                    })
                    .collect(),
            ),
            Value::Object(ref map) if map.contains_key("error") => {
                let message = match &map["error"] {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                LookupReply::Error(message)
            }
            other => LookupReply::Unexpected(other),
        }
    }
}

impl From<Vec<Candidate>> for LookupReply {
    fn from(candidates: Vec<Candidate>) -> Self {
        LookupReply::Candidates(candidates)
    }
}

/// An asynchronous candidate provider.
///
/// `query` arrives trimmed and lower-cased.
#[async_trait]
pub trait Lookup: Send + Sync {
    async fn lookup(&self, query: &str) -> LookupReply;
}

/// Adapter turning a closure returning a future into a [`Lookup`].
struct FnLookup<F> {
    f: F,
}

#[async_trait]
impl<F> Lookup for FnLookup<F>
where
    F: Fn(String) -> BoxFuture<'static, LookupReply> + Send + Sync,
{
    async fn lookup(&self, query: &str) -> LookupReply {
        (self.f)(query.to_string()).await
    }
}

/// The candidate source bound to one widget instance.
#[derive(Clone)]
pub enum LookupSource {
    Static(Arc<Vec<Candidate>>),
    Dynamic(Arc<dyn Lookup>),
}

impl std::fmt::Debug for LookupSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupSource::Static(items) => f.debug_tuple("Static").field(&items.len()).finish(),
            LookupSource::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

impl LookupSource {
    pub fn from_list(candidates: Vec<Candidate>) -> Self {
        LookupSource::Static(Arc::new(candidates))
    }

    pub fn from_lookup(lookup: impl Lookup + 'static) -> Self {
        LookupSource::Dynamic(Arc::new(lookup))
    }

    /// Wrap an async closure. The closure receives the normalised query.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = LookupReply> + Send + 'static,
    {
        let boxed = move |query: String| -> BoxFuture<'static, LookupReply> { Box::pin(f(query)) };
        LookupSource::Dynamic(Arc::new(FnLookup { f: boxed }))
    }

    /// Build a static source from a dynamically described value.
    ///
    /// Only a JSON array of candidate objects is a valid source; anything else fails with
    /// [`DropdownError::InvalidLookupSource`].
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(DropdownError::InvalidLookupSource(format!(
                "expected a candidate list, got {}",
                json_kind(&value)
            )));
        };
        let mut candidates = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                return Err(DropdownError::InvalidLookupSource(format!(
                    "entry {i} is {}, expected an object",
                    json_kind(&item)
                )));
            }
            let candidate = serde_json::from_value(item)
                .map_err(|e| DropdownError::InvalidLookupSource(format!("entry {i}: {e}")))?;
            candidates.push(candidate);
        }
        Ok(Self::from_list(candidates))
    }

    /// Resolve `query` (already normalised) against this source.
    pub async fn lookup(&self, query: &str) -> LookupReply {
        match self {
            LookupSource::Static(items) => LookupReply::Candidates(filter_static(items, query)),
            LookupSource::Dynamic(lookup) => lookup.lookup(query).await,
        }
    }
}

/// Case-insensitive substring filter over a static list, preserving order.
pub fn filter_static(items: &[Candidate], query: &str) -> Vec<Candidate> {
    let needle = query.to_lowercase();
    items.iter().filter(|c| c.matches(&needle)).cloned().collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
