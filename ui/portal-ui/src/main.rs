#![allow(non_snake_case)]

mod components;
mod prompt;
mod view;

use std::sync::Arc;

use dioxus::prelude::*;

use portal_client::keyring::{self, KeySource};
use portal_client::{
    wallet, ApprovalPrompt, Config, Portal, PortalError, PortalState, RpcPortalProgram, ViewMode, WalletSlot,
};

use prompt::{ApprovalRequest, ChannelPrompt};
use view::SignalView;

const STYLE: &str = include_str!("../assets/style.css");

fn main() {
    dioxus_logger::init(tracing::Level::INFO).expect("failed to init logger");
    dioxus::launch(App);
}

/// Wire the wallet, the storage account signer and the program client
/// together from the on-disk config.
fn build_portal(prompt: Arc<ChannelPrompt>) -> Result<Portal, PortalError> {
    let config_path = Config::config_path();
    let config = Config::load(&config_path)?;
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            tracing::warn!("Could not write default config to {}: {}", config_path.display(), e);
        }
    }

    let (base_keypair, key_source) = keyring::load_base_account(config.base_account.keypair_path.as_deref())?;
    if key_source == KeySource::Bundled {
        tracing::warn!("Set base_account.keypair_path in {} to use your own signer", config_path.display());
    }

    // Looked up again on each sign-in until a keypair exists.
    let wallet = {
        let config = config.clone();
        let prompt: Arc<dyn ApprovalPrompt> = prompt;
        WalletSlot::detecting(move || wallet::detect_wallet(&config, prompt.clone()))
    };
    let program = RpcPortalProgram::new(&config, wallet.clone(), base_keypair)?;
    let base_account = program.base_account();

    Ok(Portal::new(wallet, Arc::new(program), base_account))
}

#[component]
fn App() -> Element {
    // Provide shared state to all components
    use_context_provider(|| Signal::new(PortalState::default()));
    let mut approval = use_context_provider(|| Signal::new(None::<ApprovalRequest>));

    let portal = use_hook(|| {
        let (prompt, mut requests) = ChannelPrompt::new();
        spawn(async move {
            while let Some(request) = requests.recv().await {
                approval.set(Some(request));
            }
        });
        build_portal(Arc::new(prompt)).map_err(|e| e.to_string())
    });

    rsx! {
        document::Style { {STYLE} }
        match &portal {
            Ok(portal) => rsx! { PortalRoot { portal: portal.clone() } },
            Err(msg) => rsx! {
                div { class: "container",
                    p { class: "header", "Scene Portal" }
                    p { class: "error-text", "Failed to start: {msg}" }
                }
            },
        }
    }
}

#[component]
fn PortalRoot(portal: Portal) -> Element {
    let state = use_context::<Signal<PortalState>>();
    use_context_provider(|| portal.clone());

    // Silent reconnect on start-up, like a page load with a trusted wallet.
    use_hook(|| {
        let portal = portal.clone();
        spawn(async move {
            portal.check_if_wallet_is_connected(&SignalView(state)).await;
        })
    });

    let mode = state.read().view_mode();

    rsx! {
        div { class: "App",
            div { class: if mode == ViewMode::SignedOut { "container" } else { "authed-container" },
                components::toaster::Toaster {}
                components::connect_prompt::ApprovalDialog {}
                div { class: "header-container",
                    if mode == ViewMode::SignedOut {
                        components::sign_in::SignInPage {}
                    } else {
                        components::portal::ConnectedPage {}
                    }
                }
            }
        }
    }
}
