//! Queue-draining uploads for the budget dropzone.
//!
//! Files are checked on arrival. Accepted ones wait in a queue and are sent
//! one at a time. Rejected ones are kept aside and reported together once
//! the queue is empty and nothing is uploading.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::services::notify::Notifier;
use crate::services::transport::{resolve_upload_name, FileHandle, Transport};
use crate::services::upload::{UploadActivity, UploadStatus, UploadView};
use crate::types::{AppError, TransferProgress};

/// Size and type limits applied when a file is dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptPolicy {
    pub max_size: f64,
    /// Empty accepts any type.
    pub accepted_types: Vec<String>,
}

impl AcceptPolicy {
    /// Reason the file may not be queued, if any.
    pub fn check<F: FileHandle>(&self, file: &F) -> Option<String> {
        if file.size() > self.max_size {
            return Some(format!(
                "File is too big ({:.1} MiB). Max filesize: {:.1} MiB.",
                file.size() / 1_048_576.0,
                self.max_size / 1_048_576.0
            ));
        }
        let mime_type = file.mime_type();
        if !self.accepted_types.is_empty() && !self.accepted_types.iter().any(|t| *t == mime_type) {
            return Some("You can't upload files of this type.".to_string());
        }
        None
    }
}

/// A dropped file that never made it into the queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of one full drain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<String>,
    pub rejected: Vec<Rejection>,
}

/// Dropzone-style queue with one upload in flight at most.
pub struct UploadQueue<T: Transport, N, V> {
    transport: T,
    notifier: N,
    view: V,
    activity: UploadActivity,
    url: String,
    policy: AcceptPolicy,
    pending: RefCell<VecDeque<(String, T::File)>>,
    rejected: RefCell<Vec<Rejection>>,
    draining: Cell<bool>,
}

impl<T, N, V> UploadQueue<T, N, V>
where
    T: Transport,
    N: Notifier,
    V: UploadView,
{
    pub fn new(transport: T, notifier: N, view: V, url: impl Into<String>, policy: AcceptPolicy) -> Self {
        Self {
            transport,
            notifier,
            view,
            activity: UploadActivity::new(),
            url: url.into(),
            policy,
            pending: RefCell::new(VecDeque::new()),
            rejected: RefCell::new(Vec::new()),
            draining: Cell::new(false),
        }
    }

    /// Queue `file`, or set it aside with the reason it was refused.
    pub fn accept(&self, file: T::File) -> Result<(), Rejection> {
        let name = resolve_upload_name(&file);
        let reason = match &name {
            None => Some("The file has no readable name.".to_string()),
            Some(_) => self.policy.check(&file),
        };
        let file_name = name.unwrap_or_default();

        if let Some(reason) = reason {
            log::warn!("Rejected '{}': {}", file_name, reason);
            let rejection = Rejection { file_name, reason };
            self.rejected.borrow_mut().push(rejection.clone());
            return Err(rejection);
        }

        self.pending.borrow_mut().push_back((file_name, file));
        Ok(())
    }

    pub fn queued(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_uploading(&self) -> bool {
        self.draining.get()
    }

    /// Work left for the unload guard to protect.
    pub fn has_pending_work(&self) -> bool {
        self.is_uploading() || self.queued() > 0
    }

    /// Upload queued files until the queue is empty.
    ///
    /// Returns `None` when another drain is already running; that drain
    /// picks up anything queued in the meantime.
    pub async fn drain(&self) -> Option<QueueReport> {
        if self.draining.replace(true) {
            return None;
        }
        let _busy = self.activity.begin();
        let mut report = QueueReport::default();

        loop {
            // Never hold the RefCell borrow across the await below.
            let next = self.pending.borrow_mut().pop_front();
            let Some((file_name, file)) = next else { break };

            let view = &self.view;
            let on_progress = |progress: TransferProgress| {
                if let Some(status) = UploadStatus::from_progress(&progress, 1, 1) {
                    view.show_status(&status);
                }
            };

            let outcome = match self.transport.upload(&self.url, &file, &file_name, &on_progress).await {
                Ok(reply) if reply.ok() => Ok(()),
                Ok(reply) => Err(AppError::Server { status: reply.status, body: reply.body }),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    log::info!("Uploaded '{}'", file_name);
                    report.uploaded.push(file_name);
                }
                Err(e) => {
                    self.notifier
                        .failure(&format!("Failed to upload {}: {}", file_name, e));
                    report.failed.push(file_name);
                }
            }
        }

        report.rejected = std::mem::take(&mut *self.rejected.borrow_mut());
        for rejected in &report.rejected {
            self.notifier
                .failure(&format!("Failed to upload '{}'.", rejected.file_name));
        }

        self.view.show_status(&UploadStatus::Done { uploaded: report.uploaded.len() });
        self.draining.set(false);
        Some(report)
    }
}
