//! Transient success/failure messages.

use gloo_timers::callback::Timeout;
use leptos::*;

use crate::config::{MAX_MESSAGES, MESSAGE_DISPLAY_MS};
use crate::types::{Notification, NotificationKind};

/// Shows short messages to the user.
pub trait Notifier {
    fn notify(&self, kind: NotificationKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(NotificationKind::Success, message);
    }

    fn failure(&self, message: &str) {
        self.notify(NotificationKind::Failure, message);
    }
}

/// Notifier feeding the message banner signal.
///
/// Each message removes itself after [`MESSAGE_DISPLAY_MS`].
#[derive(Clone, Copy)]
pub struct SignalNotifier {
    set_messages: WriteSignal<Vec<Notification>>,
}

impl SignalNotifier {
    pub fn new(set_messages: WriteSignal<Vec<Notification>>) -> Self {
        Self { set_messages }
    }
}

impl Notifier for SignalNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        let id: u32 = rand::random();
        let entry = Notification {
            id,
            kind,
            message: message.to_string(),
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        };

        match kind {
            NotificationKind::Success => log::info!("{}", message),
            NotificationKind::Failure => log::warn!("{}", message),
        }

        self.set_messages.update(|messages| {
            messages.push(entry);
            if messages.len() > MAX_MESSAGES {
                messages.remove(0);
            }
        });

        let set_messages = self.set_messages;
        Timeout::new(MESSAGE_DISPLAY_MS, move || {
            set_messages.update(|messages| messages.retain(|m| m.id != id));
        })
        .forget();
    }
}
