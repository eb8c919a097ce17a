//! Text input with a debounced suggestion popup.

use std::rc::Rc;
use std::time::Duration;

use dioxus::html::geometry::PixelsRect;
use dioxus::prelude::*;
use roompick_core::rest::{Endpoint, RestLookup};
use roompick_core::types::RowContent;
use roompick_core::{
    InputGeometry, LookupSource, Placement, Rect, SearchStep, SearchableDropdown, Selection,
};

use super::SignalInput;
use crate::state::{demo_candidates, CORE};

type Dropdown = Signal<SearchableDropdown<SignalInput>>;

const VIEWPORT_HEIGHT: f64 = 700.0;

#[component]
pub fn SuggestInput(
    label: &'static str,
    placeholder: &'static str,
    endpoint: Endpoint,
    mut selection: Signal<Selection>,
) -> Element {
    let text = use_signal(String::new);
    let state = use_signal(String::new);
    let geometry = use_signal(InputGeometry::default);
    let mut field_el = use_signal(|| None::<Rc<MountedData>>);
    let mut input_el = use_signal(|| None::<Rc<MountedData>>);
    let mut popup_hovered = use_signal(|| false);
    let pending = use_signal(|| None::<Task>);

    let tuning = CORE.read().as_ref().map(|s| s.tuning.clone()).unwrap_or_default();
    let mut dropdown: Dropdown = use_signal(move || {
        let host = SignalInput {
            text,
            state,
            geometry,
            popup_hovered,
            viewport_height: VIEWPORT_HEIGHT,
        };
        SearchableDropdown::with_config(host, Placement::InsertAfter, tuning)
    });
    let source = use_hook(move || lookup_source(endpoint));

    // Window resizes always hide the popup; the input may have moved, so measure it again.
    use_future(move || async move {
        let mut resized = document::eval(
            r#"
            window.addEventListener("resize", () => dioxus.send(true));
            await new Promise(() => {});
            "#,
        );
        while resized.recv::<bool>().await.is_ok() {
            dropdown.write().on_resize();
            measure(field_el, input_el, geometry).await;
        }
    });

    // Publish the committed pick to the form.
    use_effect(move || {
        let picked = Selection { display_text: text.read().clone(), value: state.read().clone() };
        selection.set(picked);
    });

    let popup = dropdown.read().popup().clone();
    let popup_css = popup.style.to_css();

    rsx! {
        div {
            class: "suggest-field",
            onmounted: move |e: Event<MountedData>| async move {
                field_el.set(Some(e.data()));
                measure(field_el, input_el, geometry).await;
            },

            label { class: "suggest-label", "{label}" }

            input {
                class: "suggest-input",
                r#type: "text",
                placeholder: "{placeholder}",
                value: "{text}",
                "data-value": "{state}",
                onmounted: move |e: Event<MountedData>| async move {
                    input_el.set(Some(e.data()));
                    measure(field_el, input_el, geometry).await;
                },
                oninput: {
                    let mut text = text;
                    move |e: Event<FormData>| text.set(e.value())
                },
                onkeyup: {
                    let source = source.clone();
                    move |_| {
                        cancel_pending(pending);
                        let step = dropdown.write().on_key_up();
                        drive(dropdown, source.clone(), pending, step);
                    }
                },
                onfocus: move |_| async move {
                    measure(field_el, input_el, geometry).await;
                    dropdown.write().on_focus();
                },
                onblur: move |_| {
                    if !dropdown.read().on_blur() {
                        return;
                    }
                    let grace = dropdown.read().config().blur_grace;
                    spawn(async move {
                        tokio::time::sleep(grace).await;
                        dropdown.write().on_blur_elapsed();
                    });
                },
            }

            if popup.visible {
                div {
                    class: "suggest-popup",
                    style: "{popup_css}",
                    onmouseenter: move |_| popup_hovered.set(true),
                    onmouseleave: move |_| popup_hovered.set(false),
                    for row in popup.rows.iter() {
                        {
                            let index = row.index;
                            let select = move |_: MouseEvent| {
                                dropdown.write().select(index);
                                popup_hovered.set(false);
                            };
                            match &row.content {
                                RowContent::Text(t) => rsx! {
                                    div {
                                        key: "{row.value}-{index}",
                                        class: "suggest-item",
                                        "data-value": "{row.value}",
                                        onclick: select,
                                        "{t}"
                                    }
                                },
                                RowContent::Html(h) => rsx! {
                                    div {
                                        key: "{row.value}-{index}",
                                        class: "suggest-item",
                                        "data-value": "{row.value}",
                                        onclick: select,
                                        dangerous_inner_html: "{h}",
                                    }
                                },
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Pick the lookup for an endpoint: the REST backend when one is configured, otherwise a
/// small built-in list.
fn lookup_source(endpoint: Endpoint) -> LookupSource {
    let core = CORE.read();
    let host = core.as_ref().map(|s| s.host.clone()).unwrap_or_default();
    if host.has_api() {
        match RestLookup::for_endpoint(host.api_baseurl(), endpoint) {
            Ok(lookup) => return LookupSource::from_lookup(lookup),
            Err(e) => tracing::warn!(error = %e, "Falling back to the built-in list"),
        }
    } else {
        tracing::info!(?endpoint, "API_BASEURL not set; using the built-in list");
    }
    LookupSource::from_list(demo_candidates(endpoint))
}

fn to_rect(r: PixelsRect) -> Rect {
    Rect::new(r.origin.x, r.origin.y, r.size.width, r.size.height)
}

/// Refresh the input geometry once both the field and its input are mounted. The popup is
/// positioned inside the field, so the offset box is taken relative to the field's corner.
async fn measure(
    field: Signal<Option<Rc<MountedData>>>,
    input: Signal<Option<Rc<MountedData>>>,
    mut geometry: Signal<InputGeometry>,
) {
    let (Some(field), Some(input)) = (field.peek().clone(), input.peek().clone()) else {
        return;
    };
    match (field.get_client_rect().await, input.get_client_rect().await) {
        (Ok(outer), Ok(inner)) => geometry.set(InputGeometry::within(to_rect(inner), to_rect(outer))),
        (Err(e), _) | (_, Err(e)) => tracing::debug!(error = ?e, "Could not measure picker input"),
    }
}

fn cancel_pending(mut pending: Signal<Option<Task>>) {
    if let Some(task) = pending.write().take() {
        task.cancel();
    }
}

/// Debounced search: cancel the armed timer, then either arm a new one or start the lookup.
fn search(
    mut dropdown: Dropdown,
    source: LookupSource,
    pending: Signal<Option<Task>>,
    query: String,
    delay: Duration,
) {
    cancel_pending(pending);
    let step = dropdown.write().request(&query, delay);
    drive(dropdown, source, pending, step);
}

fn drive(
    mut dropdown: Dropdown,
    source: LookupSource,
    mut pending: Signal<Option<Task>>,
    step: SearchStep,
) {
    match step {
        SearchStep::Debounce { query, delay } => {
            let task = spawn(async move {
                tokio::time::sleep(delay).await;
                pending.set(None);
                search(dropdown, source, pending, query, Duration::ZERO);
            });
            pending.set(Some(task));
        }
        SearchStep::Lookup(ticket) => {
            spawn(async move {
                let reply = source.lookup(&ticket.query).await;
                let outcome = dropdown.write().apply(&ticket, reply);
                tracing::debug!(query = ticket.query.as_str(), ?outcome, "Lookup applied");
            });
        }
        SearchStep::Unchanged => {}
    }
}
