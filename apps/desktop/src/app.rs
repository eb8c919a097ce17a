//! Root application component: a booking form with two searchable pickers.

use dioxus::prelude::*;
use roompick_core::rest::Endpoint;
use roompick_core::Selection;

use crate::picker::SuggestInput;
use crate::state::*;

static APP_CSS: Asset = asset!("/assets/styles/app.css");

#[component]
pub fn App() -> Element {
    // Move initial state from the static Mutex into the GlobalSignal (once)
    use_hook(|| {
        if let Some(state) = crate::INITIAL_STATE.lock().ok().and_then(|mut s| s.take()) {
            *CORE.write() = Some(state);
        }
    });

    rsx! {
        document::Stylesheet { href: APP_CSS }

        div {
            class: "app-shell",

            div {
                class: "titlebar",
                span { class: "titlebar-title", "RoomPick" }
            }

            BookingForm {}

            StatusBar {}
        }
    }
}

/// Messages for every picker that has no committed value.
pub fn missing_selections(hotel: &Selection, visitor: &Selection) -> Vec<&'static str> {
    let mut errors = Vec::new();
    if hotel.value.trim().is_empty() {
        errors.push("Please select a hotel");
    }
    if visitor.value.trim().is_empty() {
        errors.push("Please select a visitor");
    }
    errors
}

#[component]
fn BookingForm() -> Element {
    let hotel = use_signal(Selection::default);
    let visitor = use_signal(Selection::default);

    // Mirror picks into the globals the status bar reads.
    use_effect(move || *HOTEL.write() = hotel.read().clone());
    use_effect(move || *VISITOR.write() = visitor.read().clone());

    let errors = BOOKING_ERRORS.read();

    rsx! {
        form {
            class: "booking-form",
            onsubmit: move |e: Event<FormData>| {
                e.prevent_default();
                let found = missing_selections(&hotel.read(), &visitor.read());
                if found.is_empty() {
                    tracing::info!(
                        hotel = hotel.read().value.as_str(),
                        visitor = visitor.read().value.as_str(),
                        "Booking ready"
                    );
                } else {
                    tracing::debug!(?found, "Booking incomplete");
                }
                *BOOKING_ERRORS.write() = found;
            },

            SuggestInput {
                label: "Hotel",
                placeholder: "Search hotels...",
                endpoint: Endpoint::Hotels,
                selection: hotel,
            }

            SuggestInput {
                label: "Visitor",
                placeholder: "Search visitors...",
                endpoint: Endpoint::Visitors,
                selection: visitor,
            }

            if !errors.is_empty() {
                ul {
                    class: "form-errors",
                    for message in errors.iter() {
                        li { "{message}" }
                    }
                }
            }

            button { class: "form-submit", r#type: "submit", "Book" }
        }
    }
}

/// Status bar at the bottom of the app
#[component]
fn StatusBar() -> Element {
    let core = CORE.read();
    let hotel = HOTEL.read();
    let visitor = VISITOR.read();

    let backend = match core.as_ref() {
        Some(state) if state.host.has_api() => state.host.api_baseurl().to_string(),
        _ => "built-in list".to_string(),
    };
    let describe = |s: &Selection| {
        if s.value.is_empty() {
            "none".to_string()
        } else {
            format!("{} (#{})", s.display_text, s.value)
        }
    };
    let (hotel, visitor) = (describe(&hotel), describe(&visitor));

    rsx! {
        div {
            class: "status-bar",
            span { class: "status-item", "{backend}" }
            span { class: "status-item", "Hotel: {hotel}" }
            span { class: "status-item", "Visitor: {visitor}" }
        }
    }
}
