//! In-process page → native message port.

use bridge_traits::{
    error::{BridgeError, Result},
    webview::NativeMessagePort,
};
use tokio::sync::mpsc;
use tracing::trace;

/// `NativeMessagePort` that hands every posted message to an unbounded
/// channel.
///
/// Stands in for the webview message handler when the page-side flow and the
/// native transport run in the same process (desktop shells, tests). Posting
/// after the receiver is dropped fails the same way a detached webview
/// handler would.
#[derive(Clone)]
pub struct ChannelMessagePort {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelMessagePort {
    /// Create a port and the receiver the native side reads from.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wrap an existing sender, e.g. a transport inbox.
    pub fn from_sender(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl NativeMessagePort for ChannelMessagePort {
    fn post_message(&self, message: &str) -> Result<()> {
        trace!(len = message.len(), "Posting message to native channel");
        self.tx
            .send(message.to_string())
            .map_err(|_| BridgeError::NotAvailable("native message handler detached".to_string()))
    }
}
