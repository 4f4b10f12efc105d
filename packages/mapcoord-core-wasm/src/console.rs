// Log sink for the console_log! macro.
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

// Bind `console.log(..)` from the host page
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

// Native builds (tests, tools) have no JS console
#[cfg(not(target_arch = "wasm32"))]
pub fn log(s: &str) {
    eprintln!("{}", s);
}

// Note: The console_log macro is defined in lib.rs to avoid duplication
