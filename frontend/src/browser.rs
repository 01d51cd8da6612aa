//! DOM-backed implementations of the service traits.

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    BeforeUnloadEvent, Document, Element, File, FileList, HtmlInputElement, HtmlSelectElement,
    HtmlTextAreaElement,
};

use crate::services::{
    FormFeedback, FormSource, Navigator, UploadStatus, UploadView, MISSING_REQUIRED_CLASS,
};

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn element(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

fn select(selector: &str) -> Option<Element> {
    document()?.query_selector(selector).ok()?
}

/// The rendered application form, read and decorated through the DOM.
#[derive(Clone, Debug)]
pub struct DomForm {
    form_id: String,
}

impl DomForm {
    pub fn new(form_id: impl Into<String>) -> Self {
        Self { form_id: form_id.into() }
    }
}

impl FormSource for DomForm {
    fn text(&self, id: &str) -> Option<String> {
        let el = element(id)?;
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            Some(select.value())
        } else {
            el.dyn_ref::<HtmlTextAreaElement>().map(|area| area.value())
        }
    }

    fn rich_text(&self, id: &str) -> Option<String> {
        select(&format!("#{} .ql-editor", id)).map(|editor| editor.inner_html())
    }

    fn checked(&self, id: &str) -> bool {
        element(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.checked())
            .unwrap_or(false)
    }

    fn checked_radio(&self, group: &str) -> Option<String> {
        select(&format!("input[name='{}']:checked", group))?
            .dyn_into::<HtmlInputElement>()
            .ok()
            .map(|input| input.value())
    }
}

impl FormFeedback for DomForm {
    fn clear_flags(&self) {
        let Some(doc) = document() else { return };
        let Ok(flagged) = doc.query_selector_all(&format!(".{}", MISSING_REQUIRED_CLASS)) else {
            return;
        };
        for index in 0..flagged.length() {
            if let Some(el) = flagged.item(index).and_then(|n| n.dyn_into::<Element>().ok()) {
                let _ = el.class_list().remove_1(MISSING_REQUIRED_CLASS);
            }
        }
    }

    fn flag(&self, element_id: &str) {
        match element(element_id) {
            Some(el) => {
                let _ = el.class_list().add_1(MISSING_REQUIRED_CLASS);
            }
            None => log::warn!("No element '{}' to flag", element_id),
        }
    }

    fn set_busy(&self, busy: bool) {
        if let Some(form) = element(&self.form_id) {
            let _ = form.class_list().toggle_with_force("loading", busy);
        }
    }
}

/// Navigates through `window.location`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn assign(&self, target: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(target) {
                log::error!("Navigation to {} failed: {:?}", target, e);
            }
        }
    }

    fn replace(&self, target: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().replace(target) {
                log::error!("Navigation to {} failed: {:?}", target, e);
            }
        }
    }
}

impl UploadView for WriteSignal<UploadStatus> {
    fn show_status(&self, status: &UploadStatus) {
        self.set(status.clone());
    }
}

/// Ask for confirmation before leaving while `has_pending_work` says so.
///
/// The listener is removed when the calling component is cleaned up.
/// Browsers show their own text; the returned message is ignored by most.
pub fn install_unload_guard(has_pending_work: impl Fn() -> bool + 'static) {
    let Some(window) = web_sys::window() else { return };

    let on_unload = Closure::wrap(Box::new(move |event: BeforeUnloadEvent| {
        if has_pending_work() {
            event.prevent_default();
            event.set_return_value("Uploads are still in progress.");
        }
    }) as Box<dyn FnMut(BeforeUnloadEvent)>);

    if let Err(e) =
        window.add_event_listener_with_callback("beforeunload", on_unload.as_ref().unchecked_ref())
    {
        log::warn!("Could not install unload guard: {:?}", e);
        return;
    }

    on_cleanup(move || {
        if let Err(e) = window
            .remove_event_listener_with_callback("beforeunload", on_unload.as_ref().unchecked_ref())
        {
            log::warn!("Could not remove unload guard: {:?}", e);
        }
        drop(on_unload);
    });
}

/// One slot per reported file; `None` where the browser could not hand it over.
pub fn file_list_slots(files: &FileList) -> Vec<Option<File>> {
    (0..files.length()).map(|index| files.get(index)).collect()
}
