//! Sequential file upload pipeline.
//!
//! A [`UploadJob`] owns the file list and a cursor. [`UploadPipeline::run`]
//! walks the cursor one request at a time: the next file is only sent once
//! the previous one has been answered, and the first failure abandons the
//! rest of the list. Files already on the server stay there.
//!
//! Jobs started while another one runs are queued as follow-ups and sent
//! by [`UploadPipeline::run_all`] once the running job is done.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::config::{dataset_files_url, UploadProfile};
use crate::services::notify::Notifier;
use crate::services::transport::{resolve_upload_name, Transport};
use crate::types::{AppError, AppResult, DatasetFile, TransferProgress};

// =============================================================================
// Job
// =============================================================================

/// Files waiting to be sent to one target resource.
///
/// A slot is `None` when the browser reported a file it could not hand over.
#[derive(Debug)]
pub struct UploadJob<F> {
    files: Vec<Option<F>>,
    cursor: usize,
    target_id: String,
}

impl<F> UploadJob<F> {
    pub fn new(target_id: impl Into<String>, files: Vec<F>) -> Self {
        Self::from_slots(target_id, files.into_iter().map(Some).collect())
    }

    pub fn from_slots(target_id: impl Into<String>, files: Vec<Option<F>>) -> Self {
        Self {
            files,
            cursor: 0,
            target_id: target_id.into(),
        }
    }

    /// Zero-based index of the next file to send.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn is_finished(&self) -> bool {
        self.cursor == self.files.len()
    }

    fn current(&self) -> AppResult<&F> {
        self.files
            .get(self.cursor)
            .and_then(Option::as_ref)
            .ok_or(AppError::MissingFile { index: self.cursor })
    }

    fn advance(&mut self) {
        debug_assert!(self.cursor < self.files.len());
        self.cursor += 1;
    }
}

/// Summary handed back once every file of a job is on the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReport {
    pub target_id: String,
    pub uploaded: usize,
}

// =============================================================================
// Status shown in the drop area
// =============================================================================

/// What the drop area caption currently says.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    /// `current` is one-based.
    Uploading { percent: u8, current: usize, total: usize },
    /// Last byte sent; the server is checksumming the file.
    Verifying { current: usize, total: usize },
    Done { uploaded: usize },
    Failed,
    /// Drag-and-drop delivered files without names.
    Unsupported,
}

impl UploadStatus {
    /// Status for a progress event, or `None` when the length is unknown.
    pub fn from_progress(progress: &TransferProgress, current: usize, total: usize) -> Option<Self> {
        let percent = progress.percent()?;
        Some(if percent == 100 {
            UploadStatus::Verifying { current, total }
        } else {
            UploadStatus::Uploading { percent, current, total }
        })
    }

    /// Width of the progress bar fill.
    pub fn bar_percent(&self) -> u8 {
        match self {
            UploadStatus::Uploading { percent, .. } => *percent,
            UploadStatus::Verifying { .. } | UploadStatus::Done { .. } => 100,
            _ => 0,
        }
    }

    /// Secondary line under the caption.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            UploadStatus::Unsupported => {
                Some("Because the drag and drop functionality does not work for your web browser.")
            }
            _ => None,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, UploadStatus::Uploading { .. } | UploadStatus::Verifying { .. })
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadStatus::Idle => write!(f, "Drag files here"),
            UploadStatus::Uploading { percent, current, total } => {
                write!(f, "Uploading at {}% ({}/{})", percent, current, total)
            }
            UploadStatus::Verifying { current, total } => {
                write!(f, "Computing MD5 ... ({}/{})", current, total)
            }
            UploadStatus::Done { uploaded } => write!(f, "Uploaded {} file(s)", uploaded),
            UploadStatus::Failed => write!(f, "Uploading failed."),
            UploadStatus::Unsupported => write!(f, "Click here to open file dialog"),
        }
    }
}

/// Receives caption updates from a running upload.
pub trait UploadView {
    fn show_status(&self, status: &UploadStatus);
}

// =============================================================================
// Activity tracking (read by the unload guard)
// =============================================================================

/// Counts uploads in flight or queued on this page.
#[derive(Clone, Debug, Default)]
pub struct UploadActivity {
    active: Rc<Cell<usize>>,
}

impl UploadActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark work as started until the returned guard is dropped.
    pub fn begin(&self) -> ActivityGuard {
        self.active.set(self.active.get() + 1);
        ActivityGuard { active: Rc::clone(&self.active) }
    }

    pub fn is_active(&self) -> bool {
        self.active.get() > 0
    }
}

/// Keeps an [`UploadActivity`] busy while alive.
#[derive(Debug)]
pub struct ActivityGuard {
    active: Rc<Cell<usize>>,
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.active.set(self.active.get().saturating_sub(1));
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub const MSG_BROWSER_INCOMPATIBLE: &str =
    "Uploading file(s) failed due to a web browser incompatibility.";
pub const MSG_USE_FILE_CHOOSER: &str = "Uploading file(s) failed. Please try selecting files \
     with the file chooser instead of using the drag-and-drop.";
pub const MSG_UPLOAD_FAILED: &str = "Uploading file(s) failed.";
pub const MSG_UPLOAD_QUEUED: &str = "Files will be uploaded once the current upload finishes.";

/// Drives one [`UploadJob`] at a time against an upload endpoint.
pub struct UploadPipeline<T: Transport, N, V> {
    transport: T,
    notifier: N,
    view: V,
    activity: UploadActivity,
    profile: UploadProfile,
    base_url: String,
    followups: RefCell<VecDeque<UploadJob<T::File>>>,
    running: Cell<bool>,
}

impl<T, N, V> UploadPipeline<T, N, V>
where
    T: Transport,
    N: Notifier,
    V: UploadView,
{
    pub fn new(transport: T, notifier: N, view: V, profile: UploadProfile, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            notifier,
            view,
            activity: UploadActivity::new(),
            profile,
            base_url: base_url.into(),
            followups: RefCell::new(VecDeque::new()),
            running: Cell::new(false),
        }
    }

    pub fn activity(&self) -> &UploadActivity {
        &self.activity
    }

    /// Jobs waiting behind the running one.
    pub fn queued_jobs(&self) -> usize {
        self.followups.borrow().len()
    }

    /// True while a job runs or follow-ups wait; read by the unload guard.
    pub fn has_pending_work(&self) -> bool {
        self.activity.is_active() || self.queued_jobs() > 0
    }

    /// Run `job` and then every follow-up queued meanwhile.
    ///
    /// When another call is already running, `job` joins its follow-ups,
    /// the user is told so and `None` comes back. Otherwise the result of
    /// each job run by this call is returned in order. A failed job does
    /// not cancel the follow-ups.
    pub async fn run_all(&self, job: UploadJob<T::File>) -> Option<Vec<AppResult<UploadReport>>> {
        if self.running.replace(true) {
            log::info!("Upload running, queueing {} file(s) for {}", job.total(), job.target_id());
            self.followups.borrow_mut().push_back(job);
            self.notifier.success(MSG_UPLOAD_QUEUED);
            return None;
        }

        let mut results = Vec::new();
        let mut next = Some(job);
        while let Some(mut job) = next {
            results.push(self.run(&mut job).await);
            next = self.followups.borrow_mut().pop_front();
        }

        self.running.set(false);
        Some(results)
    }

    /// Upload every remaining file of `job`, strictly in order.
    ///
    /// Failures are reported to the user before being returned; the job's
    /// cursor is left on the file that failed.
    pub async fn run(&self, job: &mut UploadJob<T::File>) -> AppResult<UploadReport> {
        let total = job.total();
        let _busy = self.activity.begin();
        let url = self.profile.upload_url(&self.base_url, job.target_id());

        log::info!("Uploading {} file(s) to {}", total - job.cursor(), url);

        while !job.is_finished() {
            let index = job.cursor();
            let current = index + 1;

            let file = match job.current() {
                Ok(file) => file,
                Err(e) => return Err(self.abort(e)),
            };
            let file_name = match resolve_upload_name(file) {
                Some(name) => name,
                None => return Err(self.abort(AppError::UnnamedFile { index })),
            };

            let view = &self.view;
            let on_progress = |progress: TransferProgress| {
                if let Some(status) = UploadStatus::from_progress(&progress, current, total) {
                    view.show_status(&status);
                }
            };

            log::debug!("Uploading '{}' ({}/{})", file_name, current, total);
            let outcome = self.transport.upload(&url, file, &file_name, &on_progress).await;

            match outcome {
                Ok(reply) if reply.ok() => {
                    self.view.show_status(&UploadStatus::Idle);
                    job.advance();
                }
                Ok(reply) => {
                    return Err(self.abort(AppError::Server {
                        status: reply.status,
                        body: reply.body,
                    }))
                }
                Err(e) => return Err(self.abort(e)),
            }
        }

        self.view.show_status(&UploadStatus::Done { uploaded: total });
        Ok(UploadReport {
            target_id: job.target_id().to_string(),
            uploaded: total,
        })
    }

    fn abort(&self, error: AppError) -> AppError {
        log::error!("Upload aborted: {}", error);
        match &error {
            AppError::MissingFile { .. } => {
                self.view.show_status(&UploadStatus::Failed);
                self.notifier.failure(MSG_BROWSER_INCOMPATIBLE);
            }
            AppError::UnnamedFile { .. } => {
                self.view.show_status(&UploadStatus::Unsupported);
                self.notifier.failure(MSG_USE_FILE_CHOOSER);
            }
            _ => {
                self.view.show_status(&UploadStatus::Failed);
                self.notifier.failure(MSG_UPLOAD_FAILED);
            }
        }
        error
    }
}

/// Files the server already holds for a dataset.
pub async fn list_dataset_files<T: Transport>(
    transport: &T,
    base_url: &str,
    dataset_id: &str,
) -> AppResult<Vec<DatasetFile>> {
    let reply = transport.get(&dataset_files_url(base_url, dataset_id)).await?;
    if !reply.ok() {
        return Err(AppError::Server { status: reply.status, body: reply.body });
    }
    Ok(serde_json::from_str(&reply.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{MockFile, MockTransport, RecordingNotifier, RecordingView};
    use crate::types::NotificationKind;
    use futures::executor::block_on;

    fn pipeline(
        transport: &MockTransport,
        notifier: &RecordingNotifier,
        view: &RecordingView,
    ) -> UploadPipeline<MockTransport, RecordingNotifier, RecordingView> {
        UploadPipeline::new(
            transport.clone(),
            notifier.clone(),
            view.clone(),
            UploadProfile::Dataset,
            "",
        )
    }

    fn files(names: &[&str]) -> Vec<MockFile> {
        names.iter().map(|n| MockFile::new(n)).collect()
    }

    #[test]
    fn test_uploads_every_file_in_order() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::new("ds-1", files(&["a.csv", "b.csv", "c.csv"]));

        let report = block_on(pipeline(&transport, &notifier, &view).run(&mut job)).unwrap();

        assert_eq!(report.uploaded, 3);
        assert!(job.is_finished());
        assert_eq!(transport.uploaded_names(), vec!["a.csv", "b.csv", "c.csv"]);
        assert!(transport.requests().iter().all(|r| r.url == "/v3/datasets/ds-1/upload"));
        assert_eq!(transport.max_in_flight(), 1);
        assert!(notifier.messages().is_empty());
        assert_eq!(view.last(), Some(UploadStatus::Done { uploaded: 3 }));
    }

    #[test]
    fn test_failure_stops_remaining_files() {
        let transport = MockTransport::new().fail_upload(1);
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::new("ds-1", files(&["a.csv", "b.csv", "c.csv"]));

        let result = block_on(pipeline(&transport, &notifier, &view).run(&mut job));

        assert!(matches!(result, Err(AppError::Server { status: 500, .. })));
        assert_eq!(transport.uploaded_names(), vec!["a.csv", "b.csv"]);
        assert_eq!(job.cursor(), 1);
        assert_eq!(
            notifier.messages(),
            vec![(NotificationKind::Failure, MSG_UPLOAD_FAILED.to_string())]
        );
        assert_eq!(view.last(), Some(UploadStatus::Failed));
    }

    #[test]
    fn test_network_error_is_terminal() {
        let transport = MockTransport::new().drop_connection(0);
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::new("ds-1", files(&["a.csv", "b.csv"]));

        let result = block_on(pipeline(&transport, &notifier, &view).run(&mut job));

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(transport.uploaded_names(), vec!["a.csv"]);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[test]
    fn test_missing_file_slot_abandons_job() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::from_slots("ds-1", vec![Some(MockFile::new("a.csv")), None]);

        let result = block_on(pipeline(&transport, &notifier, &view).run(&mut job));

        assert_eq!(result, Err(AppError::MissingFile { index: 1 }));
        assert_eq!(transport.uploaded_names(), vec!["a.csv"]);
        assert_eq!(
            notifier.messages(),
            vec![(NotificationKind::Failure, MSG_BROWSER_INCOMPATIBLE.to_string())]
        );
        assert_eq!(view.last(), Some(UploadStatus::Failed));
    }

    #[test]
    fn test_unnamed_file_asks_for_file_chooser() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::new("ds-1", vec![MockFile::unnamed(), MockFile::new("b.csv")]);

        let result = block_on(pipeline(&transport, &notifier, &view).run(&mut job));

        assert_eq!(result, Err(AppError::UnnamedFile { index: 0 }));
        assert!(transport.requests().is_empty());
        assert_eq!(view.last(), Some(UploadStatus::Unsupported));
        assert_eq!(notifier.messages()[0].1, MSG_USE_FILE_CHOOSER);
    }

    #[test]
    fn test_relative_path_is_sent_as_file_name() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::new(
            "ds-1",
            vec![MockFile::new("x.txt").with_relative_path("folder/x.txt")],
        );

        block_on(pipeline(&transport, &notifier, &view).run(&mut job)).unwrap();

        assert_eq!(transport.uploaded_names(), vec!["folder/x.txt"]);
    }

    #[test]
    fn test_progress_captions() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job = UploadJob::new("ds-1", files(&["a.csv", "b.csv"]));

        block_on(pipeline(&transport, &notifier, &view).run(&mut job)).unwrap();

        let captions: Vec<String> = view.statuses().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            captions,
            vec![
                "Uploading at 50% (1/2)",
                "Computing MD5 ... (1/2)",
                "Drag files here",
                "Uploading at 50% (2/2)",
                "Computing MD5 ... (2/2)",
                "Drag files here",
                "Uploaded 2 file(s)",
            ]
        );
    }

    #[test]
    fn test_activity_released_after_run() {
        let transport = MockTransport::new().fail_upload(0);
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let pipeline = pipeline(&transport, &notifier, &view);
        let mut job = UploadJob::new("ds-1", files(&["a.csv"]));

        let _ = block_on(pipeline.run(&mut job));

        assert!(!pipeline.activity().is_active());
        assert!(!pipeline.has_pending_work());
    }

    #[test]
    fn test_files_dropped_mid_upload_follow_up() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let pipeline = pipeline(&transport, &notifier, &view);
        let first = UploadJob::new("ds-1", files(&["a.csv", "b.csv"]));
        let second = UploadJob::new("ds-1", files(&["c.csv"]));

        let (running, queued) = block_on(async {
            futures::join!(pipeline.run_all(first), pipeline.run_all(second))
        });

        let reports: Vec<usize> = running.unwrap().into_iter().map(|r| r.unwrap().uploaded).collect();
        assert_eq!(reports, vec![2, 1]);
        assert!(queued.is_none());
        assert_eq!(transport.uploaded_names(), vec!["a.csv", "b.csv", "c.csv"]);
        assert_eq!(transport.max_in_flight(), 1);
        assert_eq!(
            notifier.messages(),
            vec![(NotificationKind::Success, MSG_UPLOAD_QUEUED.to_string())]
        );
        assert!(!pipeline.has_pending_work());
    }

    #[test]
    fn test_failed_job_still_runs_follow_ups() {
        let transport = MockTransport::new().fail_upload(0);
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let pipeline = pipeline(&transport, &notifier, &view);

        let (running, _) = block_on(async {
            futures::join!(
                pipeline.run_all(UploadJob::new("ds-1", files(&["a.csv"]))),
                pipeline.run_all(UploadJob::new("ds-1", files(&["b.csv"]))),
            )
        });

        let results = running.unwrap();
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().map(|r| r.uploaded), Ok(1));
        assert_eq!(transport.uploaded_names(), vec!["a.csv", "b.csv"]);
    }

    #[test]
    fn test_activity_guard_nesting() {
        let activity = UploadActivity::new();
        let outer = activity.begin();
        let inner = activity.begin();
        drop(outer);
        assert!(activity.is_active());
        drop(inner);
        assert!(!activity.is_active());
    }

    #[test]
    fn test_empty_job_sends_nothing() {
        let transport = MockTransport::new();
        let notifier = RecordingNotifier::default();
        let view = RecordingView::default();
        let mut job: UploadJob<MockFile> = UploadJob::new("ds-1", Vec::new());

        let report = block_on(pipeline(&transport, &notifier, &view).run(&mut job)).unwrap();

        assert_eq!(report.uploaded, 0);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_list_dataset_files() {
        let transport = MockTransport::new().reply(
            "/v3/datasets/ds-1/files",
            200,
            r#"[{"name":"a.csv","size":12}]"#,
        );

        let files = block_on(list_dataset_files(&transport, "", "ds-1")).unwrap();
        assert_eq!(files, vec![DatasetFile { name: "a.csv".into(), size: 12 }]);

        let missing = MockTransport::new().reply("/v3/datasets/ds-2/files", 403, "");
        assert!(block_on(list_dataset_files(&missing, "", "ds-2")).is_err());
    }
}
