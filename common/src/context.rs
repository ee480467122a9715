use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

struct Inner {
    token: CancellationToken,
    // Dropped together with the last context clone, which closes the handler's
    // receiver.
    _alive: mpsc::Sender<()>,
}

/// A cloneable shutdown signal handed to every long running task.
#[derive(Clone)]
pub struct Context(Arc<Inner>);

/// The owning side of a [`Context`].
pub struct Handler {
    token: CancellationToken,
    alive: mpsc::Receiver<()>,
}

impl Context {
    #[must_use]
    pub fn new() -> (Self, Handler) {
        let token = CancellationToken::new();
        let (alive_tx, alive_rx) = mpsc::channel(1);

        (
            Self(Arc::new(Inner {
                token: token.clone(),
                _alive: alive_tx,
            })),
            Handler { token, alive: alive_rx },
        )
    }

    /// Resolves once the handler cancels.
    pub async fn done(&self) {
        self.0.token.cancelled().await
    }

    pub fn is_done(&self) -> bool {
        self.0.token.is_cancelled()
    }
}

impl Handler {
    /// Resolves once every clone of the context has been dropped.
    pub async fn done(&mut self) {
        while self.alive.recv().await.is_some() {}
    }

    /// Cancels the context and waits for every clone to be dropped.
    pub async fn cancel(mut self) {
        self.token.cancel();
        self.done().await;
    }
}
