/// Sink for user-facing, non-fatal sign-in messages.
///
/// A CLI prints them, a UI shell shows a dialog.
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// Default notifier: records alerts in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, title: &str, message: &str) {
        tracing::warn!(title, message, "user alert");
    }
}
