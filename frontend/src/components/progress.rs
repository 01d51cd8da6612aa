use leptos::*;

use crate::services::UploadStatus;

/// Progress bar and caption under an upload area.
#[component]
pub fn UploadProgress(status: ReadSignal<UploadStatus>) -> impl IntoView {
    view! {
        <div class="progress-section" class:show=move || status.get().is_busy()>
            <div class="progress-bar">
                <div
                    class="progress-fill"
                    style=move || format!("width: {}%;", status.get().bar_percent())
                ></div>
            </div>
        </div>
    }
}
