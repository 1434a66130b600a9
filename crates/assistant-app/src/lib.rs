//! Assistant App: WASM entry point.
//!
//! This crate is the composition root (DI wiring layer).
//! It assembles the platform adapters, hands them to the orchestrator and
//! exports the result to the page as `AssistantApp`.

mod app;

pub use app::{relative_age, target_languages, AssistantApp};

use wasm_bindgen::prelude::*;

/// WASM entry point: runs when the module is instantiated
#[wasm_bindgen(start)]
pub fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Assistant WASM starting...");
}
