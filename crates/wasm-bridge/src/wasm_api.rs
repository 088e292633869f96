//! WASM entry points for the web worker.
//!
//! This module is only compiled for the `wasm32` target. Every call is
//! stateless: the host sends the whole transmission each time.

use wasm_bindgen::prelude::*;

/// Install the panic hook. Call once before any other function.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Process a JSON [`crate::Envelope`] and return a JSON [`crate::Response`].
#[wasm_bindgen]
pub fn process_message(json_input: &str) -> String {
    crate::dispatch::process_json(json_input)
}
