//! Lookups backed by the booking REST API.
//!
//! `GET {api}/api/hotels?hotelname=<q>` answers with `[{hotelId, hotelname, pricePerNight}]`,
//! `GET {api}/api/visitors?name=<q>` with `[{visitorId, firstname, lastname}]`. On failure the
//! backend answers `{"success": false, "error": "..."}`. Rows are mapped to candidates by a
//! [`RowMapping`]; transport and decode failures come back as [`LookupReply::Error`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::url_for;
use crate::error::{DropdownError, Result};
use crate::lookup::{Lookup, LookupReply};
use crate::types::Candidate;

/// How backend rows turn into candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMapping {
    /// Fields joined with a space to form the display text.
    pub text_fields: Vec<String>,
    /// Field carrying the opaque value.
    pub value_field: String,
}

impl RowMapping {
    pub fn new(text_fields: &[&str], value_field: &str) -> Self {
        Self {
            text_fields: text_fields.iter().map(|s| s.to_string()).collect(),
            value_field: value_field.to_string(),
        }
    }

    /// Map one row. Missing fields leave the candidate incomplete rather than failing.
    pub fn candidate(&self, row: &Value) -> Candidate {
        let parts: Vec<String> = self
            .text_fields
            .iter()
            .filter_map(|f| row.get(f).and_then(scalar))
            .collect();
        Candidate {
            display_text: (!parts.is_empty()).then(|| parts.join(" ")),
            value: row.get(&self.value_field).and_then(scalar),
            rendered_html: None,
        }
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A backend collection the widget can search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Hotels,
    Visitors,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Hotels => "/api/hotels",
            Endpoint::Visitors => "/api/visitors",
        }
    }

    pub fn query_param(self) -> &'static str {
        match self {
            Endpoint::Hotels => "hotelname",
            Endpoint::Visitors => "name",
        }
    }

    pub fn mapping(self) -> RowMapping {
        match self {
            Endpoint::Hotels => RowMapping::new(&["hotelname"], "hotelId"),
            Endpoint::Visitors => RowMapping::new(&["firstname", "lastname"], "visitorId"),
        }
    }
}

impl std::str::FromStr for Endpoint {
    type Err = DropdownError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hotels" | "hotel" => Ok(Endpoint::Hotels),
            "visitors" | "visitor" => Ok(Endpoint::Visitors),
            other => Err(DropdownError::InvalidLookupSource(format!(
                "unknown endpoint '{other}' (expected hotels or visitors)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RestLookup {
    client: Client,
    url: Url,
    query_param: String,
    mapping: RowMapping,
}

impl RestLookup {
    /// Lookup against an arbitrary collection path.
    pub fn new(base: &str, path: &str, query_param: &str, mapping: RowMapping) -> Result<Self> {
        let raw = url_for(base, path);
        let url = Url::parse(&raw).map_err(|e| DropdownError::InvalidBaseUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client: Client::new(),
            url,
            query_param: query_param.to_string(),
            mapping,
        })
    }

    pub fn for_endpoint(base: &str, endpoint: Endpoint) -> Result<Self> {
        Self::new(base, endpoint.path(), endpoint.query_param(), endpoint.mapping())
    }

    pub fn hotels(base: &str) -> Result<Self> {
        Self::for_endpoint(base, Endpoint::Hotels)
    }

    pub fn visitors(base: &str) -> Result<Self> {
        Self::for_endpoint(base, Endpoint::Visitors)
    }

    /// Reuse an existing client (connection pool, timeouts).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn map_body(&self, body: Value) -> LookupReply {
        match body {
            Value::Array(rows) => {
                LookupReply::Candidates(rows.iter().map(|row| self.mapping.candidate(row)).collect())
            }
            other => LookupReply::from_json(other),
        }
    }
}

#[async_trait]
impl Lookup for RestLookup {
    async fn lookup(&self, query: &str) -> LookupReply {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair(&self.query_param, query);
        debug!(url = %url, "Fetching candidates");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Lookup request failed");
                return LookupReply::Error(e.to_string());
            }
        };
        let status = response.status();
        match response.json::<Value>().await {
            Ok(body) => self.map_body(body),
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "Lookup response was not JSON");
                LookupReply::Error(format!("HTTP {status}: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn visitor_rows_join_names() {
        let c = Endpoint::Visitors
            .mapping()
            .candidate(&json!({ "visitorId": 7, "firstname": "Ada", "lastname": "Lovelace" }));
        assert_eq!(c, Candidate::new("Ada Lovelace", "7"));
    }

    #[test]
    fn hotel_row_without_id_is_incomplete() {
        let c = Endpoint::Hotels.mapping().candidate(&json!({ "hotelname": "Grand" }));
        assert!(!c.is_complete());
    }

    #[test]
    fn endpoint_parses_names() {
        assert_eq!("Hotels".parse::<Endpoint>().unwrap(), Endpoint::Hotels);
        assert!("rooms".parse::<Endpoint>().is_err());
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = RestLookup::hotels("").unwrap_err();
        assert!(matches!(err, DropdownError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn url_keeps_base_prefix() {
        let lookup = RestLookup::visitors("http://backend:5000/contoso/").unwrap();
        assert_eq!(lookup.url().as_str(), "http://backend:5000/contoso/api/visitors");
    }

    #[test]
    fn error_payload_maps_to_error_reply() {
        let lookup = RestLookup::hotels("http://backend").unwrap();
        assert_eq!(
            lookup.map_body(json!({ "success": false, "error": "no db" })),
            LookupReply::Error("no db".into())
        );
    }
}
