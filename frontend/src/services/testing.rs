//! In-memory collaborators for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use serde_json::Value;

use crate::services::notify::Notifier;
use crate::services::record::FormSource;
use crate::services::submission::{FormFeedback, Navigator};
use crate::services::transport::{FileHandle, Transport};
use crate::services::upload::{UploadStatus, UploadView};
use crate::types::{AppError, AppResult, HttpReply, NotificationKind, TransferProgress};

#[derive(Clone, Debug, PartialEq)]
pub struct MockFile {
    name: Option<String>,
    relative_path: Option<String>,
    size: f64,
    mime_type: String,
}

impl MockFile {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            relative_path: None,
            size: 1024.0,
            mime_type: "application/pdf".to_string(),
        }
    }

    pub fn unnamed() -> Self {
        Self { name: None, ..Self::new("") }
    }

    pub fn with_relative_path(mut self, path: &str) -> Self {
        self.relative_path = Some(path.to_string());
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_type(mut self, mime_type: &str) -> Self {
        self.mime_type = mime_type.to_string();
        self
    }
}

impl FileHandle for MockFile {
    fn relative_path(&self) -> Option<String> {
        self.relative_path.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn size(&self) -> f64 {
        self.size
    }

    fn mime_type(&self) -> String {
        self.mime_type.clone()
    }
}

/// Pending on the first poll, ready on the second.
///
/// Lets another task run while an upload is "on the wire", so overlapping
/// uploads show up in the in-flight count.
#[derive(Default)]
struct YieldOnce {
    polled: bool,
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.polled {
            return Poll::Ready(());
        }
        self.polled = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub file_name: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct TransportState {
    requests: RefCell<Vec<RecordedRequest>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
    failing_uploads: RefCell<HashSet<usize>>,
    dropped_uploads: RefCell<HashSet<usize>>,
    uploads_seen: Cell<usize>,
    replies: RefCell<HashMap<String, HttpReply>>,
    offline: Cell<bool>,
}

/// Records every request and answers from a script.
///
/// Uploads succeed with 201 unless marked otherwise, and report 50% and
/// 100% progress before answering, yielding once in between. Other calls
/// answer 204 unless a reply was registered for the URL.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Rc<TransportState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the upload with this zero-based index with a 500.
    pub fn fail_upload(self, index: usize) -> Self {
        self.state.failing_uploads.borrow_mut().insert(index);
        self
    }

    /// Let the upload with this zero-based index die without a response.
    pub fn drop_connection(self, index: usize) -> Self {
        self.state.dropped_uploads.borrow_mut().insert(index);
        self
    }

    pub fn reply(self, url: &str, status: u16, body: &str) -> Self {
        self.state.replies.borrow_mut().insert(
            url.to_string(),
            HttpReply { status, body: body.to_string() },
        );
        self
    }

    /// Every JSON request fails before reaching a server.
    pub fn offline(self) -> Self {
        self.state.offline.set(true);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.borrow().clone()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.file_name)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.get()
    }

    fn enter(&self) {
        let now = self.state.in_flight.get() + 1;
        self.state.in_flight.set(now);
        self.state.max_in_flight.set(self.state.max_in_flight.get().max(now));
    }

    fn leave(&self) {
        self.state.in_flight.set(self.state.in_flight.get() - 1);
    }

    fn json_reply(&self, url: &str) -> AppResult<HttpReply> {
        if self.state.offline.get() {
            return Err(AppError::Network("offline".to_string()));
        }
        Ok(self
            .state
            .replies
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or(HttpReply { status: 204, body: String::new() }))
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    type File = MockFile;

    async fn upload(
        &self,
        url: &str,
        file: &MockFile,
        file_name: &str,
        on_progress: &dyn Fn(TransferProgress),
    ) -> AppResult<HttpReply> {
        self.enter();
        let index = self.state.uploads_seen.get();
        self.state.uploads_seen.set(index + 1);
        self.state.requests.borrow_mut().push(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            file_name: Some(file_name.to_string()),
            body: None,
        });

        let total = file.size;
        on_progress(TransferProgress { loaded: total / 2.0, total, length_computable: true });
        YieldOnce::default().await;
        on_progress(TransferProgress { loaded: total, total, length_computable: true });
        self.leave();

        if self.state.dropped_uploads.borrow().contains(&index) {
            return Err(AppError::Network("connection reset".to_string()));
        }
        if self.state.failing_uploads.borrow().contains(&index) {
            return Ok(HttpReply { status: 500, body: String::new() });
        }
        Ok(HttpReply { status: 201, body: String::new() })
    }

    async fn put_json(&self, url: &str, body: &Value) -> AppResult<HttpReply> {
        self.state.requests.borrow_mut().push(RecordedRequest {
            method: "PUT",
            url: url.to_string(),
            file_name: None,
            body: Some(body.clone()),
        });
        self.json_reply(url)
    }

    async fn post(&self, url: &str) -> AppResult<HttpReply> {
        self.state.requests.borrow_mut().push(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            file_name: None,
            body: None,
        });
        self.json_reply(url)
    }

    async fn get(&self, url: &str) -> AppResult<HttpReply> {
        self.state.requests.borrow_mut().push(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            file_name: None,
            body: None,
        });
        self.json_reply(url)
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Rc<RefCell<Vec<(NotificationKind, String)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(NotificationKind, String)> {
        self.messages.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        self.messages.borrow_mut().push((kind, message.to_string()));
    }
}

#[derive(Clone, Default)]
pub struct RecordingView {
    statuses: Rc<RefCell<Vec<UploadStatus>>>,
}

impl RecordingView {
    pub fn statuses(&self) -> Vec<UploadStatus> {
        self.statuses.borrow().clone()
    }

    pub fn last(&self) -> Option<UploadStatus> {
        self.statuses.borrow().last().cloned()
    }
}

impl UploadView for RecordingView {
    fn show_status(&self, status: &UploadStatus) {
        self.statuses.borrow_mut().push(status.clone());
    }
}

/// Form state kept in plain maps.
#[derive(Default)]
pub struct MapForm {
    pub text: HashMap<String, String>,
    pub rich: HashMap<String, String>,
    pub checked: HashSet<String>,
    pub radios: HashMap<String, String>,
}

impl MapForm {
    pub fn text(mut self, id: &str, value: &str) -> Self {
        self.text.insert(id.to_string(), value.to_string());
        self
    }

    pub fn rich(mut self, id: &str, value: &str) -> Self {
        self.rich.insert(id.to_string(), value.to_string());
        self
    }

    pub fn check(mut self, id: &str) -> Self {
        self.checked.insert(id.to_string());
        self
    }

    pub fn radio(mut self, group: &str, value: &str) -> Self {
        self.radios.insert(group.to_string(), value.to_string());
        self
    }
}

impl FormSource for MapForm {
    fn text(&self, id: &str) -> Option<String> {
        self.text.get(id).cloned()
    }

    fn rich_text(&self, id: &str) -> Option<String> {
        self.rich.get(id).cloned()
    }

    fn checked(&self, id: &str) -> bool {
        self.checked.contains(id)
    }

    fn checked_radio(&self, group: &str) -> Option<String> {
        self.radios.get(group).cloned()
    }
}

/// Keeps the set of flagged element ids and the busy overlay state.
#[derive(Clone)]
pub struct RecordingFeedback {
    flagged: Rc<RefCell<Vec<String>>>,
    busy: Rc<Cell<bool>>,
}

impl RecordingFeedback {
    pub fn with_flags(ids: &[&str]) -> Self {
        Self {
            flagged: Rc::new(RefCell::new(ids.iter().map(|s| s.to_string()).collect())),
            busy: Rc::new(Cell::new(false)),
        }
    }

    pub fn flagged(&self) -> Vec<String> {
        self.flagged.borrow().clone()
    }

    pub fn busy(&self) -> bool {
        self.busy.get()
    }
}

impl Default for RecordingFeedback {
    fn default() -> Self {
        Self::with_flags(&[])
    }
}

impl FormFeedback for RecordingFeedback {
    fn clear_flags(&self) {
        self.flagged.borrow_mut().clear();
    }

    fn flag(&self, element_id: &str) {
        self.flagged.borrow_mut().push(element_id.to_string());
    }

    fn set_busy(&self, busy: bool) {
        self.busy.set(busy);
    }
}

#[derive(Clone, Default)]
pub struct RecordingNavigator {
    visits: Rc<RefCell<Vec<(&'static str, String)>>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<(&'static str, String)> {
        self.visits.borrow().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn assign(&self, target: &str) {
        self.visits.borrow_mut().push(("assign", target.to_string()));
    }

    fn replace(&self, target: &str) {
        self.visits.borrow_mut().push(("replace", target.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_overlapping_uploads_are_counted() {
        let transport = MockTransport::new();
        let (a, b) = (MockFile::new("a.csv"), MockFile::new("b.csv"));
        let ignore = |_: TransferProgress| {};

        let (first, second) = block_on(async {
            futures::join!(
                transport.upload("/u", &a, "a.csv", &ignore),
                transport.upload("/u", &b, "b.csv", &ignore),
            )
        });

        assert!(first.is_ok() && second.is_ok());
        assert_eq!(transport.max_in_flight(), 2);
    }
}
