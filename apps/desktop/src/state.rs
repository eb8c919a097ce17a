//! Global application state using Dioxus signals.

use dioxus::prelude::*;
use roompick_core::config::{default_config_path, load_dropdown_config, HostConfig};
use roompick_core::rest::Endpoint;
use roompick_core::{Candidate, DropdownConfig, Selection};

/// Settings resolved once at startup.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub host: HostConfig,
    pub tuning: DropdownConfig,
}

impl AppState {
    /// Resolve host settings from `./secrets-store` and the environment, and widget tuning from
    /// `./.roompick.toml`.
    pub fn from_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        let secrets = cwd.join("secrets-store");
        AppState {
            host: HostConfig::load(Some(&secrets)),
            tuning: load_dropdown_config(&default_config_path(&cwd)),
        }
    }
}

/// Sample rows used when no API base URL is configured.
pub fn demo_candidates(endpoint: Endpoint) -> Vec<Candidate> {
    match endpoint {
        Endpoint::Hotels => vec![
            Candidate::new("Grand Budapest", "3"),
            Candidate::new("Overlook", "2"),
            Candidate::new("Grand Central", "1"),
        ],
        Endpoint::Visitors => vec![
            Candidate::new("Ada Lovelace", "7"),
            Candidate::new("Alan Turing", "8"),
            Candidate::new("Grace Hopper", "9"),
        ],
    }
}

// ---------------------------------------------------------------------------
// Global signals
// ---------------------------------------------------------------------------

/// Startup settings: set once on first render
pub static CORE: GlobalSignal<Option<AppState>> = Signal::global(|| None);

/// Committed hotel pick
pub static HOTEL: GlobalSignal<Selection> = Signal::global(Selection::default);

/// Committed visitor pick
pub static VISITOR: GlobalSignal<Selection> = Signal::global(Selection::default);

/// Validation messages from the last booking check
pub static BOOKING_ERRORS: GlobalSignal<Vec<&'static str>> = Signal::global(Vec::new);
