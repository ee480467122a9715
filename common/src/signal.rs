use tokio::signal::unix::SignalKind;
use tokio::sync::mpsc;

/// Fans several unix signals into one receiver.
pub struct SignalHandler {
    signal_send: mpsc::Sender<SignalKind>,
    signal_recv: mpsc::Receiver<SignalKind>,
}

impl Default for SignalHandler {
    fn default() -> Self {
        let (signal_send, signal_recv) = mpsc::channel(1);
        Self {
            signal_send,
            signal_recv,
        }
    }
}

impl SignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signal(self, kind: SignalKind) -> std::io::Result<Self> {
        let mut signal = tokio::signal::unix::signal(kind)?;

        let send = self.signal_send.clone();
        tokio::spawn(async move {
            while signal.recv().await.is_some() {
                if send.send(kind).await.is_err() {
                    break;
                }
            }
        });

        Ok(self)
    }

    /// Waits for the next registered signal.
    pub async fn recv(&mut self) -> Option<SignalKind> {
        self.signal_recv.recv().await
    }
}
