//! Streamed reply assembly.
//!
//! Fragments are forwarded to the caller's sink as they arrive and
//! concatenated locally. The assembler is consumed by `finish` or `fail`,
//! so a reply is closed out exactly once.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// What the transport layer receives while a turn runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyEvent {
    /// Next piece of the assistant's reply.
    Fragment(String),
    /// The reply is complete; carries the full text.
    Finished(String),
    /// The turn failed; carries the user-facing message.
    Error(String),
}

pub type ReplySink = UnboundedSender<ReplyEvent>;

/// Collects one reply's fragments while forwarding them.
#[derive(Debug)]
pub struct ReplyAssembler {
    sink: ReplySink,
    buffer: String,
    fragments: usize,
}

impl ReplyAssembler {
    pub fn new(sink: ReplySink) -> Self {
        Self {
            sink,
            buffer: String::new(),
            fragments: 0,
        }
    }

    pub fn push(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.buffer.push_str(fragment);
        self.fragments += 1;
        self.send(ReplyEvent::Fragment(fragment.to_string()));
    }

    /// Text assembled so far.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Close the reply and return its full text.
    pub fn finish(self) -> String {
        self.send(ReplyEvent::Finished(self.buffer.clone()));
        self.buffer
    }

    /// Close the partial reply, then report `message` to the user.
    /// Returns whatever text had arrived.
    pub fn fail(self, message: &str) -> String {
        self.send(ReplyEvent::Finished(self.buffer.clone()));
        self.send(ReplyEvent::Error(message.to_string()));
        self.buffer
    }

    fn send(&self, event: ReplyEvent) {
        if self.sink.send(event).is_err() {
            debug!("Reply receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn drain(rx: &mut mpsc::UnboundedReceiver<ReplyEvent>) -> Vec<ReplyEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_fragments_forwarded_and_coalesced() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reply = ReplyAssembler::new(tx);
        reply.push("I hear ");
        reply.push("");
        reply.push("you.");
        assert_eq!(reply.fragment_count(), 2);

        let text = reply.finish();
        assert_eq!(text, "I hear you.");
        assert_eq!(
            drain(&mut rx),
            vec![
                ReplyEvent::Fragment("I hear ".to_string()),
                ReplyEvent::Fragment("you.".to_string()),
                ReplyEvent::Finished("I hear you.".to_string()),
            ]
        );
    }

    #[test]
    fn test_fail_finalizes_partial_then_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reply = ReplyAssembler::new(tx);
        reply.push("Let me");
        let partial = reply.fail("Sorry, try again.");

        assert_eq!(partial, "Let me");
        let events = drain(&mut rx);
        assert_eq!(events[1], ReplyEvent::Finished("Let me".to_string()));
        assert_eq!(events[2], ReplyEvent::Error("Sorry, try again.".to_string()));
    }

    #[test]
    fn test_dropped_receiver_is_harmless() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut reply = ReplyAssembler::new(tx);
        reply.push("still assembled");
        assert_eq!(reply.finish(), "still assembled");
    }
}
