// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tokio::sync::broadcast;

/// Only a handful of interrupts can be in flight before an evaluation sees one.
pub const INTERRUPT_CHANNEL_CAPACITY: usize = 16;

/// The interrupt signal source. Anything that can observe `Ctrl+C` (the line editor, a
/// `SIGINT` handler task) calls [`Self::notify()`], and the [`crate::EvalScheduler`]
/// subscribes while an evaluation is pending.
#[derive(Debug, Clone)]
pub struct InterruptNotifier {
    pub sender: broadcast::Sender<()>,
}

impl Default for InterruptNotifier {
    fn default() -> Self { Self::new() }
}

impl InterruptNotifier {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel::<()>(INTERRUPT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Returns the number of subscribers that will see this interrupt. Zero means no
    /// evaluation was armed to receive it, and the caller should handle it itself.
    #[must_use]
    pub fn notify(&self) -> usize { self.sender.send(()).unwrap_or(0) }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> { self.sender.subscribe() }

    #[must_use]
    pub fn is_armed(&self) -> bool { self.sender.receiver_count() > 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_notify_without_subscriber_reaches_nobody() {
        let notifier = InterruptNotifier::new();
        assert!(!notifier.is_armed());
        assert_eq!(notifier.notify(), 0);
    }

    #[tokio::test]
    #[allow(clippy::needless_return)]
    async fn test_notify_reaches_subscriber() {
        let notifier = InterruptNotifier::new();
        let mut receiver = notifier.subscribe();
        assert!(notifier.is_armed());
        assert_eq!(notifier.clone().notify(), 1);
        assert!(receiver.recv().await.is_ok());
        drop(receiver);
        assert!(!notifier.is_armed());
    }
}
