//! Wall-clock hour boundary ticker.
//!
//! Drives re-projection of the hourly window and, in watch mode, refreshes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::projection::next_full_hour;

/// Emits the instant of each full hour as it passes.
///
/// Boundaries missed while the process was suspended are skipped, not
/// replayed. Dropping the ticker stops its task.
pub struct HourlyTicker {
    rx: mpsc::Receiver<DateTime<Utc>>,
    token: CancellationToken,
}

impl HourlyTicker {
    pub fn spawn() -> Self {
        Self::spawn_with_token(CancellationToken::new())
    }

    /// Spawn a ticker that also stops when `token` is cancelled.
    pub fn spawn_with_token(token: CancellationToken) -> Self {
        let (tx, rx) = mpsc::channel(4);
        let task_token = token.clone();
        tokio::spawn(run(tx, task_token));
        Self { rx, token }
    }

    /// Next boundary, or `None` once the ticker has stopped.
    pub async fn tick(&mut self) -> Option<DateTime<Utc>> {
        self.rx.recv().await
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for HourlyTicker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(tx: mpsc::Sender<DateTime<Utc>>, token: CancellationToken) {
    let Some(mut boundary) = next_full_hour(Utc::now()) else {
        tracing::error!("Clock out of range, hourly ticker not started");
        return;
    };

    loop {
        let wait = (boundary - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        tracing::trace!("Next hourly tick at {} (in {:?})", boundary, wait);

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }

        if tx.send(boundary).await.is_err() {
            break;
        }

        let following = boundary + chrono::Duration::hours(1);
        boundary = match next_full_hour(Utc::now()) {
            Some(next) => next.max(following),
            None => following,
        };
    }

    tracing::debug!("Hourly ticker stopped");
}
