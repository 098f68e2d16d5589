use std::time::Duration;

use dioxus::prelude::*;

use portal_client::{Notice, NoticeKind, PortalState};

const TOAST_DURATION: Duration = Duration::from_secs(3);

#[component]
pub fn Toaster() -> Element {
    let state = use_context::<Signal<PortalState>>();
    let notices = state.read().notices.clone();

    rsx! {
        div { class: "toaster",
            for notice in notices {
                Toast { key: "{notice.id}", notice: notice.clone() }
            }
        }
    }
}

#[component]
fn Toast(notice: Notice) -> Element {
    let mut state = use_context::<Signal<PortalState>>();

    let id = notice.id;
    use_hook(move || {
        spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            state.write().dismiss_notice(id);
        })
    });

    let class = match notice.kind {
        NoticeKind::Info => "toast",
        NoticeKind::Success => "toast toast-success",
    };

    rsx! {
        div { class: class,
            if notice.kind == NoticeKind::Success {
                span { class: "toast-icon", "✓" }
            }
            span { "{notice.message}" }
        }
    }
}
