//! FAIR Data Fund - Frontend Rust/Leptos Application
//!
//! A WebAssembly frontend for the FAIR Data Fund application and review
//! forms, with sequential file uploads and draft saving.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        App                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  MessageBanner (transient notifications)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Routes                                                      │
//! │  ├── /application-form         NewApplicationPage            │
//! │  ├── /application-form/:id     ApplicationFormPage           │
//! │  ├── /application-form/:id/submit  SubmittedPage            │
//! │  ├── /review/dashboard         ReviewDashboard               │
//! │  ├── /review/:id               ReviewFormPage                │
//! │  └── /datasets/:id             DatasetUploadPage             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Footer                                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Common types (Notification, TransferProgress, errors)
//! - [`services`] - Upload pipeline, queue, form record and submission
//! - [`browser`] - DOM-backed implementations of the service traits
//! - [`components`] - UI components

use leptos::*;
use leptos_meta::*;
use leptos_router::*;
use wasm_bindgen::prelude::*;

// =============================================================================
// Module declarations
// =============================================================================

pub mod browser;
pub mod components;
pub mod config;
pub mod services;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::*;

pub use types::{
    // Messages
    Notification, NotificationKind,
    // API
    CreatedApplication, DatasetFile, Institution, SubmitResponse, ValidationError,
    // Errors
    AppError, AppResult,
};

pub use components::*;

// =============================================================================
// Application Entry Point
// =============================================================================

/// WASM entry point - called automatically by trunk.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("FAIR Data Fund forms starting");

    mount_to_body(|| view! { <App/> });
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let (messages, set_messages) = create_signal(Vec::<Notification>::new());
    let notifier = services::SignalNotifier::new(set_messages);

    view! {
        <Title text="FAIR Data Fund"/>
        <Router>
            <MessageBanner messages=messages set_messages=set_messages/>
            <main class="container">
                <Routes>
                    <Route
                        path="/application-form"
                        view=move || view! { <NewApplicationPage notifier=notifier/> }
                    />
                    <Route
                        path="/application-form/:id"
                        view=move || view! { <ApplicationFormPage notifier=notifier/> }
                    />
                    <Route path="/application-form/:id/submit" view=SubmittedPage/>
                    <Route path="/review/dashboard" view=ReviewDashboard/>
                    <Route
                        path="/review/:id"
                        view=move || view! { <ReviewFormPage notifier=notifier/> }
                    />
                    <Route
                        path="/datasets/:id"
                        view=move || view! { <DatasetUploadPage notifier=notifier/> }
                    />
                </Routes>
            </main>
        </Router>
        <Footer/>
    }
}
