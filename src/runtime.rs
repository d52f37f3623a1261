//! Timer primitives shared by the timeout race and the retry scheduler.
//!
//! Native targets use `tokio::time`; `wasm32` goes through the JS global's
//! `setTimeout` and `Date.now()`, since neither tokio timers nor
//! `std::time::Instant` exist in browser runtimes.

use std::{future::Future, pin::pin, time::Duration};

use futures::future::{select, Either};

/// Suspends the current task for `duration` without blocking the thread.
#[cfg(not(target_arch = "wasm32"))]
pub(crate) async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
pub(crate) async fn sleep(duration: Duration) {
    use wasm_bindgen::{JsCast, JsValue};

    let millis = duration.as_millis().min(i32::MAX as u128) as f64;
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let global = js_sys::global();
        let scheduled = js_sys::Reflect::get(&global, &JsValue::from_str("setTimeout"))
            .ok()
            .and_then(|value| value.dyn_into::<js_sys::Function>().ok())
            .map(|set_timeout| {
                set_timeout
                    .call2(&global, &resolve, &JsValue::from_f64(millis))
                    .is_ok()
            })
            .unwrap_or(false);
        // No timer host: resolve right away rather than hang forever.
        if !scheduled {
            let _ = resolve.call0(&JsValue::UNDEFINED);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Measures elapsed wall-clock time for one attempt.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Stopwatch {
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
}

impl Stopwatch {
    pub(crate) fn start() -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            started: std::time::Instant::now(),
            #[cfg(target_arch = "wasm32")]
            started_ms: js_sys::Date::now(),
        }
    }

    pub(crate) fn elapsed_ms(&self) -> u64 {
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.started.elapsed().as_millis().min(u64::MAX as u128) as u64
        }
        #[cfg(target_arch = "wasm32")]
        {
            (js_sys::Date::now() - self.started_ms).max(0.0) as u64
        }
    }
}

/// Races `future` against a timer of `deadline`.
///
/// Returns `None` when the timer fires first. `select` polls its first
/// argument first, so a deadline that is already due wins even if the
/// future became ready in the same tick. The losing future is dropped,
/// which means a completion arriving later is never observed.
pub(crate) async fn with_deadline<F: Future>(deadline: Duration, future: F) -> Option<F::Output> {
    let timer = pin!(sleep(deadline));
    let future = pin!(future);
    match select(timer, future).await {
        Either::Left(((), _)) => None,
        Either::Right((output, _)) => Some(output),
    }
}
