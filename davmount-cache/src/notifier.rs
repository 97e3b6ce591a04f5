use tokio::sync::mpsc;
use tracing::info;

/// Tells the host that the listing of a folder is no longer current.
pub trait ChangeNotifier: Send + Sync {
    fn notify_folder_changed(&self, parent_id: i64);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ChangeNotifier for LogNotifier {
    fn notify_folder_changed(&self, parent_id: i64) {
        info!(parent_id, "folder changed");
    }
}

/// Forwards changed folder ids to a receiver owned by the host.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<i64>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<i64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn notify_folder_changed(&self, parent_id: i64) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.tx.send(parent_id);
    }
}
