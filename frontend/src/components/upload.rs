//! Upload areas with drag & drop support.
//!
//! [`FileUploadArea`] sends dataset files through the sequential pipeline;
//! [`BudgetDropzone`] feeds the budget queue.

use std::rc::Rc;

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Event, File, FileList, HtmlInputElement};

use super::UploadProgress;
use crate::browser::{file_list_slots, install_unload_guard};
use crate::config::{UploadProfile, BACKEND_URL, BUDGET_ACCEPTED_TYPES, MAX_BUDGET_FILE_SIZE};
use crate::services::{
    list_dataset_files, AcceptPolicy, BrowserTransport, SignalNotifier, UploadJob, UploadPipeline,
    UploadQueue, UploadStatus,
};
use crate::types::DatasetFile;

fn open_file_dialog(input_id: &str) {
    if let Some(window) = web_sys::window() {
        if let Some(document) = window.document() {
            if let Some(input) = document.get_element_by_id(input_id) {
                if let Some(html_input) = input.dyn_ref::<HtmlInputElement>() {
                    html_input.click();
                }
            }
        }
    }
}

fn allow_drop(ev: DragEvent) {
    ev.prevent_default();
}

fn dropped_files(ev: &DragEvent) -> Option<FileList> {
    ev.prevent_default();
    ev.data_transfer()?.files()
}

#[component]
pub fn FileUploadArea(
    /// Dataset receiving the files
    dataset_id: String,
    notifier: SignalNotifier,
) -> impl IntoView {
    let (status, set_status) = create_signal(UploadStatus::Idle);
    let (files, set_files) = create_signal(Vec::<DatasetFile>::new());

    let pipeline = Rc::new(UploadPipeline::new(
        BrowserTransport,
        notifier,
        set_status,
        UploadProfile::Dataset,
        BACKEND_URL,
    ));
    {
        let pipeline = pipeline.clone();
        install_unload_guard(move || pipeline.has_pending_work());
    }

    let refresh = {
        let dataset_id = dataset_id.clone();
        move || {
            let dataset_id = dataset_id.clone();
            spawn_local(async move {
                match list_dataset_files(&BrowserTransport, BACKEND_URL, &dataset_id).await {
                    Ok(list) => set_files.set(list),
                    Err(e) => log::warn!("Could not list files of {}: {}", dataset_id, e),
                }
            });
        }
    };
    refresh();

    let start = {
        let refresh = refresh.clone();
        move |slots: Vec<Option<File>>| {
            if slots.is_empty() {
                return;
            }
            let pipeline = pipeline.clone();
            let refresh = refresh.clone();
            let job = UploadJob::from_slots(dataset_id.clone(), slots);
            spawn_local(async move {
                // Queued behind a running upload, which refreshes when done.
                let Some(results) = pipeline.run_all(job).await else { return };
                // Failures were already shown; whatever made it is listed.
                for report in results.into_iter().flatten() {
                    log::info!("Uploaded {} file(s) to {}", report.uploaded, report.target_id);
                }
                refresh();
            });
        }
    };
    let start_from_drop = start.clone();

    let on_file_change = move |ev: Event| {
        let input: HtmlInputElement = event_target(&ev);
        if let Some(list) = input.files() {
            start(file_list_slots(&list));
        }
        input.set_value("");
    };

    let on_drop = move |ev: DragEvent| {
        if let Some(list) = dropped_files(&ev) {
            start_from_drop(file_list_slots(&list));
        }
    };

    view! {
        <div
            class="upload-section"
            id="file-upload"
            on:click=move |_| open_file_dialog("dataset-files")
            on:dragover=allow_drop
            on:drop=on_drop
        >
            <h4>{move || status.get().to_string()}</h4>
            <Show when=move || status.get().hint().is_some() fallback=|| view! {}>
                <div class="upload-hint">{move || status.get().hint().unwrap_or_default()}</div>
            </Show>
            <input
                type="file"
                id="dataset-files"
                multiple=true
                style="display:none"
                on:click=|ev| ev.stop_propagation()
                on:change=on_file_change
            />
        </div>
        <UploadProgress status=status/>
        <ul class="uploaded-files">
            <For
                each=move || files.get()
                key=|file| file.name.clone()
                children=|file| view! {
                    <li>{file.name} " (" {file.size} " bytes)"</li>
                }
            />
        </ul>
    }
}

#[component]
pub fn BudgetDropzone(
    /// Application the budget belongs to
    application_id: String,
    notifier: SignalNotifier,
) -> impl IntoView {
    let (status, set_status) = create_signal(UploadStatus::Idle);
    let (uploaded, set_uploaded) = create_signal(Vec::<String>::new());

    let policy = AcceptPolicy {
        max_size: MAX_BUDGET_FILE_SIZE,
        accepted_types: BUDGET_ACCEPTED_TYPES.iter().map(|t| t.to_string()).collect(),
    };
    let queue = Rc::new(UploadQueue::new(
        BrowserTransport,
        notifier,
        set_status,
        UploadProfile::Budget.upload_url(BACKEND_URL, &application_id),
        policy,
    ));
    {
        let queue = queue.clone();
        install_unload_guard(move || queue.has_pending_work());
    }

    let enqueue = move |list: FileList| {
        for index in 0..list.length() {
            if let Some(file) = list.get(index) {
                // Rejections are reported once the queue settles.
                let _ = queue.accept(file);
            }
        }
        let queue = queue.clone();
        spawn_local(async move {
            if let Some(report) = queue.drain().await {
                set_uploaded.update(|names| names.extend(report.uploaded));
            }
        });
    };
    let enqueue_from_drop = enqueue.clone();

    let on_file_change = move |ev: Event| {
        let input: HtmlInputElement = event_target(&ev);
        if let Some(list) = input.files() {
            enqueue(list);
        }
        input.set_value("");
    };

    let on_drop = move |ev: DragEvent| {
        if let Some(list) = dropped_files(&ev) {
            enqueue_from_drop(list);
        }
    };

    view! {
        <div
            class="upload-section dropzone"
            id="budget-dropzone"
            on:click=move |_| open_file_dialog("budget-files")
            on:dragover=allow_drop
            on:drop=on_drop
        >
            <div class="upload-text">{move || status.get().to_string()}</div>
            <input
                type="file"
                id="budget-files"
                multiple=true
                style="display:none"
                on:click=|ev| ev.stop_propagation()
                on:change=on_file_change
            />
        </div>
        <UploadProgress status=status/>
        <ul class="uploaded-files">
            <For
                each=move || uploaded.get()
                key=|name| name.clone()
                children=|name| view! { <li>{name}</li> }
            />
        </ul>
    }
}

/// Stand-alone page for adding files to an existing dataset.
#[component]
pub fn DatasetUploadPage(notifier: SignalNotifier) -> impl IntoView {
    let params = leptos_router::use_params_map();
    let dataset_id = params.with_untracked(|p| p.get("id").cloned().unwrap_or_default());

    view! {
        <super::Hero title="Upload data files"/>
        <FileUploadArea dataset_id=dataset_id notifier=notifier/>
    }
}
