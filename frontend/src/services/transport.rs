//! HTTP transport used by the upload pipeline and the form client.
//!
//! JSON requests go through `gloo-net`. File uploads use a raw
//! `XMLHttpRequest` because fetch exposes no upload-progress events.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, StreamExt};
use gloo_net::http::Request;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, File, FormData, ProgressEvent, XmlHttpRequest};

use crate::types::{AppError, AppResult, HttpReply, TransferProgress};

/// Something the browser can hand us as an upload.
pub trait FileHandle {
    /// Path relative to a dropped directory, if any.
    fn relative_path(&self) -> Option<String>;
    /// Plain file name.
    fn name(&self) -> Option<String>;
    /// Size in bytes.
    fn size(&self) -> f64;
    /// MIME type, empty when unknown.
    fn mime_type(&self) -> String;
}

/// Pick the name sent along with the file body.
///
/// Directory drops carry a relative path which keeps the tree intact on the
/// server; otherwise the plain name is used. Empty strings count as absent.
pub fn resolve_upload_name<F: FileHandle + ?Sized>(file: &F) -> Option<String> {
    file.relative_path()
        .filter(|path| !path.is_empty())
        .or_else(|| file.name().filter(|name| !name.is_empty()))
}

/// Network seam between the form logic and the browser.
///
/// `Err` is reserved for requests that never got a response; any HTTP
/// status comes back as an [`HttpReply`].
#[async_trait(?Send)]
pub trait Transport {
    type File: FileHandle;

    /// `POST` one file as the multipart field `file`.
    async fn upload(
        &self,
        url: &str,
        file: &Self::File,
        file_name: &str,
        on_progress: &dyn Fn(TransferProgress),
    ) -> AppResult<HttpReply>;

    /// `PUT` a JSON body.
    async fn put_json(&self, url: &str, body: &Value) -> AppResult<HttpReply>;

    /// `POST` without a body.
    async fn post(&self, url: &str) -> AppResult<HttpReply>;

    /// Plain `GET`.
    async fn get(&self, url: &str) -> AppResult<HttpReply>;
}

// =============================================================================
// Browser implementation
// =============================================================================

impl FileHandle for File {
    fn relative_path(&self) -> Option<String> {
        // Not part of the standard File IDL, so read it reflectively.
        js_sys::Reflect::get(self, &JsValue::from_str("webkitRelativePath"))
            .ok()
            .and_then(|v| v.as_string())
    }

    fn name(&self) -> Option<String> {
        Some(File::name(self))
    }

    fn size(&self) -> f64 {
        Blob::size(self)
    }

    fn mime_type(&self) -> String {
        Blob::type_(self)
    }
}

/// Transport backed by `gloo-net` and `XMLHttpRequest`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTransport;

fn js_error(e: JsValue) -> AppError {
    let message = js_sys::Reflect::get(&e, &"message".into())
        .ok()
        .and_then(|v| v.as_string())
        .or_else(|| e.as_string())
        .unwrap_or_else(|| format!("{:?}", e));
    AppError::Dom(message)
}

async fn into_reply(response: gloo_net::http::Response) -> HttpReply {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    HttpReply { status, body }
}

#[async_trait(?Send)]
impl Transport for BrowserTransport {
    type File = File;

    async fn upload(
        &self,
        url: &str,
        file: &File,
        file_name: &str,
        on_progress: &dyn Fn(TransferProgress),
    ) -> AppResult<HttpReply> {
        let form_data = FormData::new().map_err(js_error)?;
        form_data
            .append_with_blob_and_filename("file", file, file_name)
            .map_err(js_error)?;

        let xhr = XmlHttpRequest::new().map_err(js_error)?;
        xhr.open("POST", url).map_err(js_error)?;

        // Progress events are forwarded over a channel so `on_progress`
        // can stay a plain borrowed callback.
        let (progress_tx, mut progress_rx) = mpsc::unbounded::<TransferProgress>();
        let onprogress = Closure::wrap(Box::new(move |evt: ProgressEvent| {
            let _ = progress_tx.unbounded_send(TransferProgress {
                loaded: evt.loaded(),
                total: evt.total(),
                length_computable: evt.length_computable(),
            });
        }) as Box<dyn FnMut(ProgressEvent)>);

        let upload = xhr.upload().map_err(js_error)?;
        upload.set_onprogress(Some(onprogress.as_ref().unchecked_ref()));

        let (done_tx, done_rx) = oneshot::channel::<bool>();
        let done_tx = Rc::new(RefCell::new(Some(done_tx)));

        let onload = {
            let done_tx = Rc::clone(&done_tx);
            Closure::wrap(Box::new(move |_: web_sys::Event| {
                if let Some(tx) = done_tx.borrow_mut().take() {
                    let _ = tx.send(true);
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        let onerror = {
            let done_tx = Rc::clone(&done_tx);
            Closure::wrap(Box::new(move |_: web_sys::Event| {
                if let Some(tx) = done_tx.borrow_mut().take() {
                    let _ = tx.send(false);
                }
            }) as Box<dyn FnMut(web_sys::Event)>)
        };
        xhr.set_onload(Some(onload.as_ref().unchecked_ref()));
        xhr.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        xhr.set_onabort(Some(onerror.as_ref().unchecked_ref()));

        xhr.send_with_opt_form_data(Some(&form_data)).map_err(js_error)?;

        let mut done_rx = done_rx.fuse();
        let completed = loop {
            futures::select! {
                progress = progress_rx.next() => {
                    if let Some(progress) = progress {
                        on_progress(progress);
                    }
                }
                done = done_rx => break done.unwrap_or(false),
            }
        };

        // Detach handlers before the closures are dropped.
        upload.set_onprogress(None);
        xhr.set_onload(None);
        xhr.set_onerror(None);
        xhr.set_onabort(None);

        if !completed {
            return Err(AppError::Network(format!("Upload of '{}' was interrupted", file_name)));
        }

        let status = xhr.status().map_err(js_error)?;
        let body = xhr.response_text().ok().flatten().unwrap_or_default();
        Ok(HttpReply { status, body })
    }

    async fn put_json(&self, url: &str, body: &Value) -> AppResult<HttpReply> {
        let request = Request::put(url)
            .header("Accept", "application/json")
            .json(body)
            .map_err(|e| AppError::Network(format!("Failed to build request: {}", e)))?;

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

        Ok(into_reply(response).await)
    }

    async fn post(&self, url: &str) -> AppResult<HttpReply> {
        let response = Request::post(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

        Ok(into_reply(response).await)
    }

    async fn get(&self, url: &str) -> AppResult<HttpReply> {
        let response = Request::get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Network(format!("HTTP request failed: {}", e)))?;

        Ok(into_reply(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::MockFile;

    #[test]
    fn test_relative_path_wins_over_name() {
        let file = MockFile::new("data.csv").with_relative_path("survey/data.csv");
        assert_eq!(resolve_upload_name(&file).as_deref(), Some("survey/data.csv"));
    }

    #[test]
    fn test_empty_relative_path_falls_back_to_name() {
        let file = MockFile::new("data.csv").with_relative_path("");
        assert_eq!(resolve_upload_name(&file).as_deref(), Some("data.csv"));
    }

    #[test]
    fn test_no_name_at_all() {
        let file = MockFile::unnamed();
        assert_eq!(resolve_upload_name(&file), None);

        let file = MockFile::new("");
        assert_eq!(resolve_upload_name(&file), None);
    }
}
