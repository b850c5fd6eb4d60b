use log::warn;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Sends to the device thread if one is running, and silently does nothing otherwise.
pub struct OptionalSender<T>(pub Option<mpsc::Sender<T>>);

impl<T: std::fmt::Debug> OptionalSender<T> {
    /// Blocks while the queue is full; the device thread drains it every frame.
    pub fn send(&self, value: impl Into<T>) {
        let Some(sender) = &self.0 else {
            return;
        };

        let value = value.into();
        if let Err(e) = sender.try_send(value) {
            match e {
                TrySendError::Full(value) => {
                    if sender.blocking_send(value).is_err() {
                        warn!("device thread is gone");
                    }
                }
                TrySendError::Closed(value) => warn!("device thread is gone, dropped {value:?}"),
            }
        }
    }
}
