//! IO handling for the LMC.
//!
//! The machine itself never blocks on IO. An `INP` instruction suspends the machine
//! until a value is supplied with [`Simulator::resume_with_input`], and an `OUT` instruction
//! appends to the simulator's output log.
//!
//! This module connects that protocol to an actual source and sink of values.
//! The interface for IO devices is defined with the [`IODevice`] trait,
//! and a simulator can be run against one with [`Simulator::run_io`].
//!
//! Besides the trait, this module also includes:
//! - [`EmptyIO`]: An `IODevice` holding the implementation for a lack of IO support.
//! - [`BufferedIO`]: An `IODevice` holding a buffered implementation for IO.
//! - [`BiChannelIO`]: An `IODevice` holding a threaded/channel implementation for IO.
//!
//! [`Simulator::resume_with_input`]: super::Simulator::resume_with_input
//! [`Simulator::run_io`]: super::Simulator::run_io

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockWriteGuard, TryLockError};
use std::thread::JoinHandle;

use crossbeam_channel as cbc;

use super::mem::Word;

/// An IO device that supplies input and accepts output.
pub trait IODevice {
    /// Reads the next input token.
    ///
    /// This may block until input is available.
    /// If there is no more input, this returns `None`.
    fn read_input(&mut self) -> Option<String>;

    /// Writes a value output by the machine.
    fn write_output(&mut self, value: Word);
}
impl dyn IODevice {} // assert IODevice is dyn safe

/// No IO. There is never any input, and output is discarded.
///
/// A simulator running with this device stops at the first `INP`.
pub struct EmptyIO;
impl IODevice for EmptyIO {
    fn read_input(&mut self) -> Option<String> {
        None
    }

    fn write_output(&mut self, _value: Word) {}
}

/// IO that reads from an input buffer and writes to an output buffer.
///
/// The buffers can be accessed in code via [`BufferedIO::get_input`] and [`BufferedIO::get_output`].
///
/// Note that if a input/output lock guard is acquired from one of the locks of this IO,
/// the input/output becomes temporarily inaccessible to the simulator.
/// Thus, a lock guard should never be leaked otherwise the simulator loses access to the input/output.
#[derive(Clone)]
pub struct BufferedIO {
    input: Arc<RwLock<VecDeque<String>>>,
    output: Arc<RwLock<Vec<Word>>>
}
impl BufferedIO {
    /// Creates a new BufferedIO.
    pub fn new() -> Self {
        Self { input: Default::default(), output: Default::default() }
    }
    /// Creates a new BufferedIO from already defined buffers.
    pub fn with_bufs(input: Arc<RwLock<VecDeque<String>>>, output: Arc<RwLock<Vec<Word>>>) -> Self {
        Self { input, output }
    }
    /// Creates a new BufferedIO with the given input tokens.
    ///
    /// ```
    /// use lmc_ensemble::sim::io::{BufferedIO, IODevice};
    ///
    /// let mut io = BufferedIO::with_input(["1", "2"]);
    /// assert_eq!(io.read_input().as_deref(), Some("1"));
    /// assert_eq!(io.read_input().as_deref(), Some("2"));
    /// assert_eq!(io.read_input(), None);
    /// ```
    pub fn with_input<S: Into<String>>(input: impl IntoIterator<Item=S>) -> Self {
        let input = input.into_iter().map(Into::into).collect();
        Self::with_bufs(Arc::new(RwLock::new(input)), Default::default())
    }

    fn try_input(&self) -> Option<RwLockWriteGuard<'_, VecDeque<String>>> {
        match self.input.try_write() {
            Ok(g) => Some(g),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
    fn try_output(&self) -> Option<RwLockWriteGuard<'_, Vec<Word>>> {
        match self.output.try_write() {
            Ok(g) => Some(g),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Gets a reference to the input buffer.
    pub fn get_input(&self) -> &Arc<RwLock<VecDeque<String>>> {
        &self.input
    }
    /// Gets a reference to the output buffer.
    pub fn get_output(&self) -> &Arc<RwLock<Vec<Word>>> {
        &self.output
    }
}
impl Default for BufferedIO {
    fn default() -> Self {
        Self::new()
    }
}
impl IODevice for BufferedIO {
    fn read_input(&mut self) -> Option<String> {
        self.try_input()?.pop_front()
    }

    fn write_output(&mut self, value: Word) {
        match self.try_output() {
            Some(mut out) => out.push(value),
            None => log::warn!("output buffer is locked, dropping output {value}"),
        }
    }
}

/// A helper struct for [`BiChannelIO::new`],
/// indicating the channel is closed and no more reads/writes will come from it.
#[derive(Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Stop;

/// An IO that reads from one channel and writes to another.
///
/// Input tokens come from a reader thread,
/// and output values are sent to a writer thread.
pub struct BiChannelIO {
    read_data:    cbc::Receiver<String>,
    #[allow(unused)]
    read_handler: JoinHandle<()>,

    write_data:    cbc::Sender<Word>,
    write_handler: JoinHandle<()>
}
impl BiChannelIO {
    /// Creates a new bi-channel IO device with the given reader and writer.
    ///
    /// This calls the reader function every time the IO needs an input token.
    /// The reader function should block until a token is ready, or return Stop
    /// if there are no more tokens to read.
    ///
    /// This calls the writer function every time a value needs to be written to the
    /// IO output.
    ///
    /// This uses threads to read and write from input and output. As such,
    /// the reader may read one token ahead of the simulator.
    pub fn new(
        mut reader: impl FnMut() -> Result<String, Stop> + Send + 'static,
        mut writer: impl FnMut(Word) -> Result<(), Stop> + Send + 'static
    ) -> Self {
        let (read_tx, read_rx) = cbc::bounded(1);
        let (write_tx, write_rx) = cbc::bounded(1);

        // Reader thread:
        let read_handler = std::thread::spawn(move || loop {
            let Ok(token) = reader() else { return };
            let Ok(()) = read_tx.send(token) else { return };
        });

        // Writer thread:
        let write_handler = std::thread::spawn(move || {
            for value in write_rx {
                let Ok(()) = writer(value) else { return };
            }
        });

        Self {
            read_data: read_rx,
            read_handler,
            write_data: write_tx,
            write_handler
        }
    }

    /// Creates a bi-channel IO device with stdin being the read data and stdout being the write data.
    ///
    /// Each non-empty line of stdin is an input token (with surrounding whitespace removed).
    /// Each output value is written to stdout on its own line.
    pub fn stdio() -> Self {
        use std::io::{self, BufRead, Write};

        Self::new(
            || {
                let mut line = String::new();
                loop {
                    line.clear();
                    match io::stdin().lock().read_line(&mut line) {
                        // EOF
                        Ok(0) | Err(_) => return Err(Stop),
                        Ok(_) if line.trim().is_empty() => continue,
                        Ok(_) => return Ok(line.trim().to_string()),
                    }
                }
            },
            |value| {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{value}")
                    .and_then(|_| stdout.flush())
                    .map_err(|_| Stop)
            }
        )
    }

    /// Closes this IO device, waiting for all output to be written.
    pub fn close(self) {
        let Self {
            read_data,
            read_handler: _,
            write_data,
            write_handler
        } = self;

        // Drop the channels.
        std::mem::drop(read_data);
        std::mem::drop(write_data);

        // Wait for the write handler to join.
        // This shouldn't block for long, because we just
        // disconnected the channel.

        // The read handler may be blocked on reading,
        // so it is not joined.
        let _ = write_handler.join();
    }
}

impl IODevice for BiChannelIO {
    fn read_input(&mut self) -> Option<String> {
        // An error here means the reader stopped (or panicked),
        // so there is no more input.
        self.read_data.recv().ok()
    }

    fn write_output(&mut self, value: Word) {
        if self.write_data.send(value).is_err() {
            log::warn!("output channel closed, dropping output {value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{BiChannelIO, BufferedIO, EmptyIO, IODevice, Stop};

    #[test]
    fn test_empty() {
        let mut io = EmptyIO;
        assert_eq!(io.read_input(), None);
        io.write_output(5);
    }

    #[test]
    fn test_buffered_shared() {
        let mut io = BufferedIO::new();
        let handle = io.clone();

        handle.get_input().write().unwrap().push_back("12".to_string());
        assert_eq!(io.read_input().as_deref(), Some("12"));
        assert_eq!(io.read_input(), None);

        io.write_output(3);
        io.write_output(-4);
        assert_eq!(*handle.get_output().read().unwrap(), vec![3, -4]);
    }

    #[test]
    fn test_bichannel() {
        let mut tokens = vec!["3".to_string(), "1".to_string()];
        let written = Arc::new(Mutex::new(vec![]));
        let w = Arc::clone(&written);

        let mut io = BiChannelIO::new(
            move || tokens.pop().ok_or(Stop),
            move |v| {
                w.lock().unwrap().push(v);
                Ok(())
            }
        );

        assert_eq!(io.read_input().as_deref(), Some("1"));
        assert_eq!(io.read_input().as_deref(), Some("3"));
        assert_eq!(io.read_input(), None);

        io.write_output(7);
        io.write_output(8);
        io.close();
        assert_eq!(*written.lock().unwrap(), vec![7, 8]);
    }
}
