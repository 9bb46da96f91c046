//! Serialized console output.
//!
//! Workers never print. They send `OutputMessage`s through an `OutputSink`;
//! one `OutputSerializer` thread writes each message as a whole line, so
//! lines from different workers never interleave.

mod serializer;

pub use serializer::OutputSerializer;

use std::fmt;
use std::sync::mpsc;

/// One line of user-facing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMessage {
    Debug(String),
    Info(String),
    /// A task ran out of retries.
    Timeout { url: String },
    Found {
        description: String,
        url: String,
        string_matched: bool,
    },
    Protected { description: String, url: String },
    /// The run is being aborted.
    Fatal(String),
}

impl fmt::Display for OutputMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMessage::Debug(text) => write!(f, "[DEBUG] {}", text),
            OutputMessage::Info(text) => write!(f, "[*] {}", text),
            OutputMessage::Timeout { url } => write!(f, "[!] Timeout on: {}", url),
            OutputMessage::Found {
                description,
                url,
                string_matched,
            } => {
                if *string_matched {
                    write!(f, "[+] String-Matched {} at: {}", description, url)
                } else {
                    write!(f, "[+] {} at: {}", description, url)
                }
            }
            OutputMessage::Protected { description, url } => {
                write!(f, "[+] *Password Protected* {} at: {}", description, url)
            }
            OutputMessage::Fatal(text) => write!(f, "[X] {}", text),
        }
    }
}

/// Producer handle for the output channel. Cheap to clone, one per worker.
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<OutputMessage>,
}

impl OutputSink {
    pub(crate) fn new(tx: mpsc::Sender<OutputMessage>) -> Self {
        Self { tx }
    }

    /// Sink with no serializer attached; messages are read from the receiver.
    pub fn detached() -> (Self, mpsc::Receiver<OutputMessage>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    /// Queue a message. Dropped silently if the serializer already stopped.
    pub fn send(&self, message: OutputMessage) {
        let _ = self.tx.send(message);
    }

    pub fn debug(&self, text: impl Into<String>) {
        self.send(OutputMessage::Debug(text.into()));
    }

    pub fn info(&self, text: impl Into<String>) {
        self.send(OutputMessage::Info(text.into()));
    }

    pub fn timeout(&self, url: impl Into<String>) {
        self.send(OutputMessage::Timeout { url: url.into() });
    }

    pub fn found(&self, description: &str, url: &str, string_matched: bool) {
        self.send(OutputMessage::Found {
            description: description.to_string(),
            url: url.to_string(),
            string_matched,
        });
    }

    pub fn protected(&self, description: &str, url: &str) {
        self.send(OutputMessage::Protected {
            description: description.to_string(),
            url: url.to_string(),
        });
    }

    pub fn fatal(&self, text: impl Into<String>) {
        self.send(OutputMessage::Fatal(text.into()));
    }
}
