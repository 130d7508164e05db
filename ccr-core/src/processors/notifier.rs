//! NotificationWriter processor.
//!
//! Receives notification descriptors emitted as handler side effects and
//! persists them to `system_notifications`. Runs strictly after the
//! originating storage transaction has committed, so a write failure here
//! never affects the reporting store.

use crate::entities::notification::SystemNotification;
use crate::events::NotificationReceiver;
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct NotificationWriter {
    pool: PgPool,
}

impl NotificationWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run until shutdown is signaled or the channel closes.
    pub async fn run(self, mut rx: NotificationReceiver, mut shutdown_rx: watch::Receiver<bool>) {
        info!("NotificationWriter started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("NotificationWriter received shutdown signal");
                        break;
                    }
                }

                maybe_request = rx.recv() => {
                    let Some(request) = maybe_request else {
                        info!("notification channel closed");
                        break;
                    };
                    debug!(title = %request.title, "persisting notification");
                    if let Err(err) = SystemNotification::insert(&self.pool, &request).await {
                        error!(
                            title = %request.title,
                            error = %err,
                            "failed to persist notification"
                        );
                    }
                }
            }
        }

        info!("NotificationWriter shutdown complete");
    }
}
