//! Timeout helper: a cancellation token armed by a timer.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels its token once `duration` elapses.
///
/// Dropping the guard disarms the timer, so a token handed to a finished
/// query can never fire later.
#[derive(Debug)]
pub struct TimeoutGuard {
    token: CancellationToken,
    timer: JoinHandle<()>,
}

impl TimeoutGuard {
    /// Arm a new token. Must be called inside a tokio runtime.
    pub fn arm(duration: Duration) -> Self {
        let token = CancellationToken::new();
        let timer = tokio::spawn({
            let token = token.clone();
            async move {
                tokio::time::sleep(duration).await;
                token.cancel();
            }
        });
        Self { token, timer }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the timer has already fired.
    pub fn fired(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.timer.abort();
    }
}
