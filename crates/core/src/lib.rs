//! RoomPick core: a searchable dropdown bound to a text input.
//!
//! On each keystroke the widget waits out a short debounce, hands the trimmed, lower-cased
//! query to a lookup (a static candidate list or an async source such as the booking REST
//! API), and either lists the candidates in a popup, auto-commits a sole match, or hides.
//!
//! - [`dropdown`]: the synchronous state machine, usable from any event loop
//! - [`driver`]: [`Autocomplete`], the tokio-driven widget
//! - [`lookup`]: lookup sources and replies
//! - [`rest`]: hotel and visitor lookups against the REST backend
//! - [`config`]: host settings and the `.roompick.toml` tuning file

pub mod config;
pub mod debounce;
pub mod driver;
pub mod dropdown;
pub mod error;
pub mod host;
pub mod lookup;
pub mod placement;
#[cfg(feature = "rest")]
pub mod rest;
pub mod types;

pub use driver::Autocomplete;
pub use dropdown::{normalize_query, LookupOutcome, LookupTicket, SearchStep, SearchableDropdown};
pub use error::DropdownError;
pub use host::{InputHost, MemoryInput};
pub use lookup::{Lookup, LookupReply, LookupSource};
pub use placement::{InputGeometry, Placement, Rect};
pub use types::{Candidate, DropdownConfig, DropdownState, PopupView, Selection};
