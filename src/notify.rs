//! User-facing notifications.

use log::error;

/// Shown when no adapter passes the eligibility filter.
pub const NO_SUPPORTED_ADAPTERS: &str = "No adapters found that are supported by this tool. \
Report a new issue with a GPU-Z screenshot if you want your card added.";

/// Sink for messages the user has to see.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Writes notifications to the log and to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        error!("{title}: {message}");
        eprintln!("{title}\n{message}");
    }
}
