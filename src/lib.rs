/// Pass Tabs - reopen closed tabs, jump between open ones, revisit today's history
/// Built with Rust + WASM + Yew

pub mod api;
pub mod capture;
pub mod constants;
pub mod domain;
pub mod error;
pub mod providers;
pub mod render;
pub mod session;
pub mod settings;
pub mod sort;
pub mod tab_data;
pub mod transform;
pub mod ui;

#[cfg(test)]
mod testing;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::EventFuture;
use crate::api::chrome::{self, ChromeHost};
use crate::capture::ClosedTabCapture;
use crate::constants::AUTO_SAVE_INTERVAL_MS;

thread_local! {
    // Listeners hold weak references; the background page owns the capture
    static CAPTURE: RefCell<Option<Rc<ClosedTabCapture<ChromeHost>>>> = const { RefCell::new(None) };
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

#[wasm_bindgen]
pub fn extract_domain(url: &str) -> String {
    domain::domain_from_url(url)
}

#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}

#[wasm_bindgen]
pub fn start_sessions() {
    yew::Renderer::<ui::sessions::SessionsViewer>::new().render();
}

// Closed-tab capture and the periodic session snapshot
#[wasm_bindgen]
pub fn start_background() {
    let host = Rc::new(ChromeHost::new());

    let capture = ClosedTabCapture::new(host.clone());
    capture.install();
    CAPTURE.with_borrow_mut(|slot| *slot = Some(capture.clone()));
    spawn_local(async move {
        if let Err(err) = capture.seed().await {
            log::error!("[seedTabsCache]: {}", err);
        }
    });

    chrome::every(AUTO_SAVE_INTERVAL_MS, move || -> EventFuture {
        let host = host.clone();
        Box::pin(async move {
            if let Err(err) = session::auto_save_current_session(host.as_ref(), false).await {
                log::error!("[autoSaveSession]: {}", err);
            }
        })
    });
}
