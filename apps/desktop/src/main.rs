//! RoomPick Desktop: Dioxus-powered booking form with searchable pickers.

use std::sync::Mutex;

use dioxus::prelude::*;

mod app;
mod picker;
mod state;

use app::App;
use state::AppState;

/// Pre-runtime storage: resolved before Dioxus launches, consumed on first render.
pub static INITIAL_STATE: Mutex<Option<AppState>> = Mutex::new(None);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roompick=info".parse().expect("static directive")),
        )
        .with_target(false)
        .init();

    let initial_state = AppState::from_cwd();
    if let Ok(mut slot) = INITIAL_STATE.lock() {
        *slot = Some(initial_state);
    }

    #[cfg(feature = "desktop")]
    {
        use dioxus::desktop::{Config, LogicalSize, WindowBuilder};

        LaunchBuilder::new()
            .with_cfg(
                Config::default()
                    .with_menu(None)
                    .with_disable_context_menu(true)
                    .with_window(
                        WindowBuilder::new()
                            .with_title("RoomPick")
                            .with_inner_size(LogicalSize::new(900.0, 700.0))
                            .with_min_inner_size(LogicalSize::new(600.0, 480.0))
                            .with_resizable(true),
                    ),
            )
            .launch(App);
    }

    #[cfg(not(feature = "desktop"))]
    {
        dioxus::launch(App);
    }
}
