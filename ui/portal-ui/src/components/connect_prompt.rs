use dioxus::prelude::*;

use crate::prompt::ApprovalRequest;

/// Shown while the wallet waits for the user to approve a connection.
#[component]
pub fn ApprovalDialog() -> Element {
    let mut approval = use_context::<Signal<Option<ApprovalRequest>>>();

    let pending = approval
        .read()
        .as_ref()
        .map(|req| (req.origin.clone(), req.wallet.to_string()));

    let Some((origin, wallet)) = pending else {
        return rsx! {};
    };

    let mut answer = move |approved: bool| {
        if let Some(request) = approval.write().take() {
            request.answer(approved);
        }
    };

    rsx! {
        div { class: "modal-backdrop",
            div { class: "modal",
                h3 { "Connect wallet?" }
                p { class: "label", "{origin} wants to view your address and request signatures." }
                p { class: "mono", "{wallet}" }
                div { class: "modal-actions",
                    button {
                        class: "cta-button clear-gif-button",
                        onclick: move |_| answer(false),
                        "Cancel"
                    }
                    button {
                        class: "cta-button submit-gif-button",
                        onclick: move |_| answer(true),
                        "Connect"
                    }
                }
            }
        }
    }
}
