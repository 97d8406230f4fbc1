// src/engine/readiness.rs

use std::time::Duration;

use tracing::debug;

use crate::viewport::{Viewport, ViewportError};

/// Polls `is_ready` up to `attempts` times, doubling the pause between
/// polls. At least one poll is always made.
pub(crate) async fn wait_until_ready(
    viewport: &dyn Viewport,
    attempts: u32,
    backoff: Duration,
) -> Result<(), ViewportError> {
    let attempts = attempts.max(1);
    let mut pause = backoff;

    for attempt in 1..=attempts {
        if viewport.is_ready().await {
            return Ok(());
        }
        if attempt < attempts {
            debug!("viewport not ready (attempt {}/{}), retrying in {:?}", attempt, attempts, pause);
            tokio::time::sleep(pause).await;
            pause = pause.saturating_mul(2);
        }
    }

    Err(ViewportError::NotReady)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::RecordingViewport;

    #[tokio::test]
    async fn ready_viewport_passes_immediately() {
        let viewport = RecordingViewport::new();
        assert_eq!(
            wait_until_ready(&viewport, 3, Duration::from_millis(100)).await,
            Ok(())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_bounded_backoff() {
        let viewport = RecordingViewport::new();
        viewport.set_ready(false);

        let started = tokio::time::Instant::now();
        let outcome = wait_until_ready(&viewport, 3, Duration::from_millis(100)).await;

        assert_eq!(outcome, Err(ViewportError::NotReady));
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn picks_up_a_viewport_that_becomes_ready() {
        let viewport = RecordingViewport::new();
        viewport.set_ready(false);

        let toggler = viewport.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            toggler.set_ready(true);
        });

        assert_eq!(
            wait_until_ready(&viewport, 3, Duration::from_millis(100)).await,
            Ok(())
        );
    }
}
