use dioxus::prelude::*;

use portal_client::state::shorten_address;
use portal_client::Submission;

const WALLET_BADGE: &str = "◈";

#[component]
pub fn GifGrid(entries: Vec<Submission>) -> Element {
    if entries.is_empty() {
        return rsx! {
            p { class: "hint", "No scenes yet. Be the first to post one." }
        };
    }

    rsx! {
        div { class: "gif-grid",
            // Index as key: the program only ever appends or clears.
            for (index, item) in entries.iter().enumerate() {
                GifItem { key: "{index}", submission: item.clone() }
            }
        }
    }
}

#[component]
fn GifItem(submission: Submission) -> Element {
    let author = shorten_address(&submission.author.to_string());

    rsx! {
        div { class: "gif-item",
            img { class: "gif-image", src: "{submission.link}", alt: "{submission.link}" }
            if let Some(comment) = &submission.comment {
                p { class: "gif-comment", "{comment}" }
            }
            div { class: "address-tag",
                span { class: "wallet-badge", "{WALLET_BADGE}" }
                p { class: "address", "@{author}" }
            }
        }
    }
}
