use dioxus::prelude::*;

use portal_client::{Portal, PortalState};

use crate::view::SignalView;

#[component]
pub fn SignInPage() -> Element {
    let state = use_context::<Signal<PortalState>>();
    let portal = use_context::<Portal>();

    let mut connecting = use_signal(|| false);

    let on_sign_in = move |_| {
        if *connecting.read() {
            return;
        }
        let portal = portal.clone();
        connecting.set(true);
        spawn(async move {
            portal.connect_wallet(&SignalView(state)).await;
            connecting.set(false);
        });
    };

    rsx! {
        div { class: "container",
            button {
                class: "cta-button connect-wallet-button",
                disabled: *connecting.read(),
                onclick: on_sign_in,
                if *connecting.read() { "CONNECTING..." } else { "SIGN IN" }
            }
            p { class: "header", "Scene Portal" }
            p { class: "sub-header", "Your favorite scenes, on the blockchain" }
            div { class: "moon" }
            div { class: "kiki" }
        }
    }
}
