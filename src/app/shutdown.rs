//! Graceful shutdown handling.

use log::info;
use tokio_util::sync::CancellationToken;

/// Cancels `token` when the process receives Ctrl-C.
///
/// The server stops accepting connections once the token is cancelled;
/// in-flight requests are allowed to finish.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    info!("Shutdown requested, finishing in-flight requests");
                    token.cancel();
                }
            }
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watcher_exits_when_token_cancelled_elsewhere() {
        let token = CancellationToken::new();
        let handle = cancel_on_ctrl_c(token.clone());
        token.cancel();
        handle.await.expect("watcher task should finish");
    }
}
