//! Progress reporting channel.
//!
//! Sorting and progress presentation are decoupled by a bounded queue with a single consumer:
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Sort pipeline  │───>│  Bounded queue  │───>│    Renderer     │
//! │  (producer)     │    │   (channel)     │    │  (own thread)   │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! A full queue blocks the sort on its next send until the renderer catches up, so the consumer must keep
//! polling for as long as the sort runs. The consumer stops on [`ProgressMessage::Finished`] only; a poll
//! timeout is an idle tick.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//!
//! use ext_int_sort::progress;
//! use ext_int_sort::{Codec, ExternalSorterBuilder};
//!
//! let (sender, receiver) = progress::channel(progress::DEFAULT_CAPACITY);
//! let printer = progress::spawn_printer(receiver, Duration::from_millis(100), |msg| eprintln!("{}", msg));
//!
//! let sorter = ExternalSorterBuilder::new()
//!     .with_codec(Codec::Binary)
//!     .with_run_capacity(1_000_000)
//!     .with_progress(sender.clone())
//!     .build()
//!     .unwrap();
//! sorter.sort(Path::new("input.bin"), Path::new("output.bin")).unwrap();
//!
//! sender.finish();
//! printer.join().unwrap();
//! ```

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 5;

/// Progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMessage {
    Text(String),
    /// No more messages will follow.
    Finished,
}

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    Message(String),
    /// Nothing arrived within the timeout.
    Idle,
    Finished,
    /// Every sender is gone without sending [`ProgressMessage::Finished`].
    Disconnected,
}

/// Creates a progress channel holding at most `capacity` pending messages (at least one).
pub fn channel(capacity: usize) -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (ProgressSender { tx }, ProgressReceiver { rx })
}

/// Producer side of the channel.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: Sender<ProgressMessage>,
}

impl ProgressSender {
    /// Sends a text message, blocking while the queue is full.
    /// A message sent after the receiver is gone is discarded.
    pub fn send(&self, text: impl Into<String>) {
        if self.tx.send(ProgressMessage::Text(text.into())).is_err() {
            log::trace!("progress receiver is gone, message discarded");
        }
    }

    /// Sends the termination sentinel.
    pub fn finish(&self) {
        if self.tx.send(ProgressMessage::Finished).is_err() {
            log::trace!("progress receiver is gone before finish");
        }
    }
}

/// Consumer side of the channel.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: Receiver<ProgressMessage>,
}

impl ProgressReceiver {
    /// Waits up to `timeout` for the next message.
    pub fn poll(&self, timeout: Duration) -> Poll {
        match self.rx.recv_timeout(timeout) {
            Ok(ProgressMessage::Text(text)) => Poll::Message(text),
            Ok(ProgressMessage::Finished) => Poll::Finished,
            Err(RecvTimeoutError::Timeout) => Poll::Idle,
            Err(RecvTimeoutError::Disconnected) => Poll::Disconnected,
        }
    }

    /// Renders messages in arrival order until the sentinel is received.
    pub fn run<F>(self, timeout: Duration, mut render: F)
    where
        F: FnMut(&str),
    {
        loop {
            match self.poll(timeout) {
                Poll::Message(text) => render(&text),
                Poll::Idle => continue,
                Poll::Finished => break,
                Poll::Disconnected => {
                    log::warn!("progress channel closed without a finish message");
                    break;
                }
            }
        }
    }
}

/// Runs [`ProgressReceiver::run`] on a dedicated thread.
pub fn spawn_printer<F>(receiver: ProgressReceiver, timeout: Duration, render: F) -> thread::JoinHandle<()>
where
    F: FnMut(&str) + Send + 'static,
{
    thread::spawn(move || receiver.run(timeout, render))
}
