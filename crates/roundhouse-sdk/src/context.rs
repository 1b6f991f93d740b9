//! Plugin execution context.

use tokio_util::sync::CancellationToken;

/// Context handed to every plugin `init`.
///
/// The cancellation token fires when the pipeline begins stopping. The engine
/// never interrupts an in-flight hook; plugins that may block for long (remote
/// fetches, waiting for the next round) should select on [`cancelled`].
///
/// [`cancelled`]: PluginContext::cancelled
#[derive(Debug, Clone, Default)]
pub struct PluginContext {
    cancel: CancellationToken,
}

impl PluginContext {
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the pipeline starts shutting down.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}
