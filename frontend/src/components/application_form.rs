//! The FAIR Data Fund application form.

use std::rc::Rc;

use leptos::*;
use leptos_router::*;

use super::{BudgetDropzone, Hero};
use crate::browser::{BrowserNavigator, DomForm};
use crate::config::BACKEND_URL;
use crate::services::{
    field_element_id, ApplicationRecord, BrowserTransport, FormClient, Notifier, SignalNotifier,
    EMPTY_EDITOR,
};
use crate::types::Institution;

/// Id of the `<form>` element; it carries the loading overlay.
pub const FORM_ID: &str = "application-form";

#[derive(Clone, Copy)]
enum Widget {
    Line,
    Area,
    Rich,
    /// One of the institutions served by the backend.
    Select,
}

const TEXT_FIELDS: &[(&str, &str, Widget)] = &[
    ("name", "Name", Widget::Line),
    ("pronouns", "Pronouns", Widget::Line),
    ("email", "E-mail address", Widget::Line),
    ("institution", "Institution", Widget::Select),
    ("faculty", "Faculty", Widget::Line),
    ("department", "Department", Widget::Line),
    ("position", "Position", Widget::Line),
    ("discipline", "Discipline", Widget::Line),
    ("datatype", "Type of data", Widget::Line),
    ("description", "Description of the data", Widget::Rich),
    ("size", "Estimated size of the data", Widget::Line),
    ("whodoesit", "Who will do the work?", Widget::Rich),
    ("achievement", "What do you want to achieve?", Widget::Rich),
    ("fair_summary", "Summary of the FAIR improvements", Widget::Area),
    ("findable", "Findable", Widget::Rich),
    ("accessible", "Accessible", Widget::Rich),
    ("interoperable", "Interoperable", Widget::Rich),
    ("reusable", "Reusable", Widget::Rich),
    ("summary", "Summary", Widget::Rich),
    ("promotion", "How will you promote the data?", Widget::Area),
];

const RADIO_FIELDS: &[(&str, &str, &[(&str, &str)])] = &[
    (
        "linked_publication",
        "Is the data linked to a publication?",
        &[("yes", "Yes"), ("no", "No")],
    ),
    (
        "data_timing",
        "When was the data collected?",
        &[
            ("decades-ago", "Decades ago"),
            ("years-ago", "Years ago"),
            ("recent", "Recently"),
            ("ongoing", "Ongoing"),
        ],
    ),
    (
        "refinement",
        "What kind of refinement is needed?",
        &[
            ("apply-metadata-standards", "Apply metadata standards"),
            ("additional-data", "Additional data"),
            ("anonymisation", "Anonymisation"),
            ("translation", "Translation"),
            ("integration", "Integration"),
            ("recovery", "Recovery"),
            ("visualisation", "Visualisation"),
            ("promotion", "Promotion"),
        ],
    ),
];

/// (record key, name the server reports errors under, label)
const CONSENTS: &[(&str, &str, &str)] = &[
    (
        "consent_to_checkpoints",
        "checkpoints_consent",
        "I agree to the checkpoints during the project.",
    ),
    (
        "consent_to_financial",
        "financial_consent",
        "I agree to the financial conditions.",
    ),
    (
        "consent_to_organization",
        "organization_consent",
        "My organization agrees with this application.",
    ),
    (
        "consent_to_interview",
        "interview_consent",
        "I would like to be interviewed about the project.",
    ),
];

fn text_widget(
    name: &'static str,
    label: &'static str,
    widget: Widget,
    record: ReadSignal<ApplicationRecord>,
    institutions: ReadSignal<Vec<Institution>>,
) -> View {
    let value = move || record.with(|r| r.value_of(name)).unwrap_or_default();
    match widget {
        Widget::Select => view! {
            <label for=name>{label}</label>
            <select
                id=name
                name=name
                prop:value=move || {
                    // Re-apply once the options exist.
                    institutions.with(|_| ());
                    value()
                }
            >
                <option value="">"Choose your institution"</option>
                <For
                    each=move || institutions.get()
                    key=|institution| institution.uuid.clone()
                    children=|institution| view! {
                        <option value=institution.uuid>{institution.name}</option>
                    }
                />
            </select>
        }
        .into_view(),
        Widget::Line => view! {
            <label for=name>{label}</label>
            <input type="text" id=name name=name prop:value=value/>
        }
        .into_view(),
        Widget::Area => view! {
            <label for=name>{label}</label>
            <textarea id=name name=name prop:value=value></textarea>
        }
        .into_view(),
        Widget::Rich => view! {
            <div id=field_element_id(name) class="texteditor-wrapper">
                <label>{label}</label>
                <div id=name class="texteditor">
                    <div
                        class="ql-editor"
                        contenteditable="true"
                        inner_html=move || {
                            record.with(|r| r.value_of(name)).unwrap_or_else(|| EMPTY_EDITOR.to_string())
                        }
                    ></div>
                </div>
            </div>
        }
        .into_view(),
    }
}

fn radio_group(
    group: &'static str,
    label: &'static str,
    options: &'static [(&'static str, &'static str)],
    record: ReadSignal<ApplicationRecord>,
) -> View {
    view! {
        <fieldset id=field_element_id(group) class="radio-group">
            <legend>{label}</legend>
            {options
                .iter()
                .map(|&(value, caption)| {
                    let id = format!("{}-{}", group, value);
                    view! {
                        <input
                            type="radio"
                            id=id.clone()
                            name=group
                            value=value
                            prop:checked=move || {
                                record.with(|r| r.value_of(group)).as_deref() == Some(value)
                            }
                        />
                        <label for=id>{caption}</label>
                    }
                })
                .collect_view()}
        </fieldset>
    }
    .into_view()
}

#[component]
pub fn ApplicationFormPage(notifier: SignalNotifier) -> impl IntoView {
    let params = use_params_map();
    let application_id = params.with_untracked(|p| p.get("id").cloned().unwrap_or_default());

    let (record, set_record) = create_signal(ApplicationRecord::default());
    let (institutions, set_institutions) = create_signal(Vec::<Institution>::new());
    let client = Rc::new(FormClient::new(
        BrowserTransport,
        notifier,
        DomForm::new(FORM_ID),
        BrowserNavigator,
        BACKEND_URL,
    ));

    {
        let client = client.clone();
        spawn_local(async move {
            match client.institutions().await {
                Ok(list) => set_institutions.set(list),
                Err(e) => {
                    log::error!("Loading institutions failed: {}", e);
                    notifier.failure("Failed to load the list of institutions.");
                }
            }
        });
    }

    {
        let client = client.clone();
        let application_id = application_id.clone();
        spawn_local(async move {
            match client.load_draft(&application_id).await {
                Ok(stored) => set_record.set(stored),
                Err(e) => {
                    log::error!("Loading application {} failed: {}", application_id, e);
                    notifier.failure("Failed to load the application form.");
                }
            }
        });
    }

    let on_save = {
        let client = client.clone();
        let application_id = application_id.clone();
        move |_| {
            let client = client.clone();
            let application_id = application_id.clone();
            spawn_local(async move {
                let record = ApplicationRecord::collect(&DomForm::new(FORM_ID));
                let _ = client.save_draft(&application_id, &record, true).await;
            });
        }
    };

    let on_submit = {
        let application_id = application_id.clone();
        move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            let client = client.clone();
            let application_id = application_id.clone();
            spawn_local(async move {
                let record = ApplicationRecord::collect(&DomForm::new(FORM_ID));
                let _ = client.submit(&application_id, &record).await;
            });
        }
    };

    view! {
        <Hero
            title="FAIR Data Fund application"
            subtitle="Your answers are kept as a draft until you submit them."
        />
        <form id=FORM_ID on:submit=on_submit>
            {TEXT_FIELDS
                .iter()
                .map(|&(name, label, widget)| text_widget(name, label, widget, record, institutions))
                .collect_view()}
            {RADIO_FIELDS
                .iter()
                .map(|&(group, label, options)| radio_group(group, label, options, record))
                .collect_view()}

            <h3>"Budget"</h3>
            <BudgetDropzone application_id=application_id notifier=notifier/>

            {CONSENTS
                .iter()
                .map(|&(key, server_name, label)| view! {
                    <div id=field_element_id(server_name) class="consent">
                        <input
                            type="checkbox"
                            id=key
                            name=key
                            prop:checked=move || record.with(|r| r.flag_of(key))
                        />
                        <label for=key>{label}</label>
                    </div>
                })
                .collect_view()}

            <div class="form-actions">
                <button type="button" id="save-button" on:click=on_save>"Save draft"</button>
                <button type="submit" id="submit-button">"Submit application"</button>
            </div>
        </form>
    }
}

/// Starts a fresh application and forwards to its form.
#[component]
pub fn NewApplicationPage(notifier: SignalNotifier) -> impl IntoView {
    let (failed, set_failed) = create_signal(false);
    let client = FormClient::new(
        BrowserTransport,
        notifier,
        DomForm::new(FORM_ID),
        BrowserNavigator,
        BACKEND_URL,
    );

    spawn_local(async move {
        if client.create().await.is_err() {
            set_failed.set(true);
        }
    });

    view! {
        <Show
            when=move || failed.get()
            fallback=|| view! { <Hero title="FAIR Data Fund application" subtitle="Preparing your form..."/> }
        >
            <Hero
                title="FAIR Data Fund application"
                subtitle="A new application could not be started. Please try again later."
            />
        </Show>
    }
}

/// Landing page after a successful submission.
#[component]
pub fn SubmittedPage() -> impl IntoView {
    view! {
        <Hero
            title="Thank you"
            subtitle="Your application has been submitted. We will contact you by e-mail."
        />
    }
}
