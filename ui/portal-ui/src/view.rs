use dioxus::prelude::*;

use portal_client::{PortalState, PortalView};

/// `PortalView` over the app's state signal.
#[derive(Clone, Copy)]
pub struct SignalView(pub Signal<PortalState>);

impl PortalView for SignalView {
    fn update<R>(&self, f: impl FnOnce(&mut PortalState) -> R) -> R {
        let mut signal = self.0;
        let mut state = signal.write();
        f(&mut *state)
    }

    fn read<R>(&self, f: impl FnOnce(&PortalState) -> R) -> R {
        f(&*self.0.read())
    }
}
