use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancellation token wired to Ctrl-C for the lifetime of one action.
pub struct CtrlC {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl CtrlC {
    pub fn arm() -> Self {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("ctrl-c received, cancelling in-flight action");
                trigger.cancel();
            }
        });
        Self { token, watcher }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for CtrlC {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
