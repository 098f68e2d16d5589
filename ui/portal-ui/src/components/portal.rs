use dioxus::prelude::*;

use portal_client::state::shorten_address;
use portal_client::{Portal, PortalState, ViewMode};

use super::gif_grid::GifGrid;
use crate::view::SignalView;

#[component]
pub fn ConnectedPage() -> Element {
    let state = use_context::<Signal<PortalState>>();

    // The storage account hasn't been created yet.
    if state.read().view_mode() == ViewMode::NeedsInitialization {
        return rsx! { InitializeAccount {} };
    }

    rsx! { SubmitPanel {} }
}

#[component]
fn InitializeAccount() -> Element {
    let state = use_context::<Signal<PortalState>>();
    let portal = use_context::<Portal>();

    let busy = state.read().is_busy();
    let account = portal.base_account().to_string();

    let on_init = move |_| {
        let portal = portal.clone();
        spawn(async move {
            portal.create_gif_account(&SignalView(state)).await;
        });
    };

    rsx! {
        div { class: "connected-container",
            button {
                class: "cta-button submit-gif-button",
                disabled: busy,
                onclick: on_init,
                if busy { "Initializing..." } else { "Do One-Time Initialization For GIF Program Account" }
            }
            p { class: "hint", "Storage account: " span { class: "mono", "{account}" } }
        }
    }
}

#[component]
fn SubmitPanel() -> Element {
    let mut state = use_context::<Signal<PortalState>>();
    let portal = use_context::<Portal>();

    let address = state
        .read()
        .wallet_address
        .map(|a| a.to_string())
        .unwrap_or_default();
    let busy = state.read().is_busy();
    let input_value = state.read().input_value.clone();
    let comment_value = state.read().comment_value.clone();
    let entries = state
        .read()
        .gif_list
        .entries()
        .map(|items| items.to_vec())
        .unwrap_or_default();

    let portal_for_send = portal.clone();
    let on_submit = move |evt: FormEvent| {
        evt.prevent_default();
        let portal = portal_for_send.clone();
        spawn(async move {
            portal.send_gif(&SignalView(state)).await;
        });
    };

    let portal_for_clear = portal.clone();
    let on_clear = move |_| {
        let portal = portal_for_clear.clone();
        spawn(async move {
            portal.clear_gifs(&SignalView(state)).await;
        });
    };

    let on_sign_out = move |_| {
        let portal = portal.clone();
        spawn(async move {
            portal.disconnect_wallet(&SignalView(state)).await;
        });
    };

    rsx! {
        div { class: "connected-container",
            p { class: "connected-header", "SCENE PORTAL" }
            button {
                class: "cta-button disconnect-wallet-button",
                onclick: on_sign_out,
                "SIGN OUT "
                span { class: "mono", "{shorten_address(&address)}" }
            }
            form { class: "form", onsubmit: on_submit,
                input {
                    r#type: "text",
                    placeholder: "post your favorite film/tv scene",
                    value: "{input_value}",
                    oninput: move |e| state.write().input_value = e.value(),
                }
                input {
                    r#type: "text",
                    class: "comment-input",
                    placeholder: "comment (optional)",
                    value: "{comment_value}",
                    oninput: move |e| state.write().comment_value = e.value(),
                }
                button { r#type: "submit", class: "cta-button submit-gif-button",
                    if busy { "Sending..." } else { "Submit" }
                }
                button { r#type: "button", class: "cta-button clear-gif-button", onclick: on_clear,
                    "CLEAR GIFS"
                }
            }
            GifGrid { entries }
        }
    }
}
