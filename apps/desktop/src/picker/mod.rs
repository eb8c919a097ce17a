//! Searchable picker fields.

mod signal_input;
mod suggest_input;

pub use signal_input::SignalInput;
pub use suggest_input::SuggestInput;
