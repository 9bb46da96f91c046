//! Single consumer thread that owns the console writer.

use std::io::{self, Write};
use std::sync::mpsc;
use std::thread::JoinHandle;

use super::{OutputMessage, OutputSink};

/// Drains the output channel on a dedicated thread.
///
/// Each message is formatted into one buffer and written with a single
/// `write_all` followed by a flush.
pub struct OutputSerializer {
    sink: OutputSink,
    handle: JoinHandle<io::Result<u64>>,
}

impl OutputSerializer {
    /// Serializer writing to stdout.
    pub fn stdout() -> Self {
        Self::spawn(io::stdout())
    }

    pub fn spawn<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<OutputMessage>();
        let handle = std::thread::spawn(move || drain(rx, writer));
        Self {
            sink: OutputSink::new(tx),
            handle,
        }
    }

    /// New producer handle.
    pub fn sink(&self) -> OutputSink {
        self.sink.clone()
    }

    /// Stop accepting messages once every sink is dropped, wait for the queue
    /// to drain, and return the number of lines written.
    pub fn finish(self) -> io::Result<u64> {
        drop(self.sink);
        self.handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "output thread panicked"))?
    }
}

fn drain<W: Write>(rx: mpsc::Receiver<OutputMessage>, mut writer: W) -> io::Result<u64> {
    let mut written = 0u64;
    for message in rx {
        let line = format!("{}\n", message);
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        written += 1;
    }
    Ok(written)
}
