//! Yield point for the browser main thread
//!
//! Awaiting a `setTimeout(0)` promise lets the event loop paint progress
//! and dispatch input before the next page is processed.

use std::future::Future;

use pdfshrink_core::YieldPoint;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserYield;

impl YieldPoint for BrowserYield {
    fn yield_now(&mut self) -> impl Future<Output = ()> {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
            });
            // Workers and other window-less hosts just continue
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });

        async move {
            let _ = JsFuture::from(promise).await;
        }
    }
}
