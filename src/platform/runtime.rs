use std::time::Duration;

/// Waits for `duration` on whichever timer the target provides.
///
/// Native builds rely on the tokio timer; wasm builds hand off to the
/// browser scheduler through `gloo-timers`.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }

    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;

    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;
}
