use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub mod protocol;
pub mod slot;

pub use protocol::{parse_status_batch, ProtocolError, Snapshot, StatusUpdate};
pub use slot::{SnapshotSlot, StampedSnapshot};

use protocol::{trim_line, ACKNOWLEDGEMENT, RECV_BLOCK_SIZE};

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_HOST: &str = "127.0.0.1";

const ACCEPT_POLL_WAIT: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub enum ListenerError {
    Bind {
        address: String,
        error: std::io::Error,
    },
    Accept(std::io::Error),
    Receive(std::io::Error),
    Send(std::io::Error),
    WorkerSpawn(std::io::Error),
    WorkerPanicked,
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind { address, error } => {
                write!(f, "failed to bind status listener on {address}: {error}")
            }
            ListenerError::Accept(error) => {
                write!(f, "failed accepting status connection: {error}")
            }
            ListenerError::Receive(error) => write!(f, "failed reading status batch: {error}"),
            ListenerError::Send(error) => {
                write!(f, "failed sending acknowledgement: {error}")
            }
            ListenerError::WorkerSpawn(error) => {
                write!(f, "failed to start status listener thread: {error}")
            }
            ListenerError::WorkerPanicked => write!(f, "status listener thread panicked"),
        }
    }
}

impl std::error::Error for ListenerError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerReport {
    pub peer: Option<SocketAddr>,
    pub accepted: usize,
    pub rejected: usize,
}

/// A bound but not yet serving status socket.
pub struct StatusListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    process_count: usize,
}

impl StatusListener {
    pub fn bind(address: impl ToSocketAddrs, process_count: usize) -> Result<Self, ListenerError> {
        let display = address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "<unresolved>".to_owned());
        let listener = TcpListener::bind(address).map_err(|error| ListenerError::Bind {
            address: display.clone(),
            error,
        })?;
        let local_addr = listener.local_addr().map_err(|error| ListenerError::Bind {
            address: display,
            error,
        })?;
        Ok(Self {
            listener,
            local_addr,
            process_count,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts serving on a dedicated thread.
    pub fn spawn(self) -> Result<ListenerHandle, ListenerError> {
        let shared = Arc::new(ListenerShared::default());
        let local_addr = self.local_addr;
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("status-listener".to_owned())
            .spawn(move || serve(self.listener, &worker_shared, self.process_count))
            .map_err(ListenerError::WorkerSpawn)?;
        Ok(ListenerHandle {
            shared,
            worker: Some(worker),
            local_addr,
        })
    }
}

#[derive(Debug, Default)]
struct ListenerShared {
    slot: SnapshotSlot,
    stopping: AtomicBool,
    stream: Mutex<Option<TcpStream>>,
}

impl ListenerShared {
    fn stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    fn track_stream(&self, stream: TcpStream) {
        if let Ok(mut slot) = self.stream.lock() {
            *slot = Some(stream);
        }
    }

    fn close_stream(&self) {
        if let Ok(mut slot) = self.stream.lock() {
            if let Some(stream) = slot.take() {
                let _ = stream.shutdown(Shutdown::Both);
            }
        }
    }
}

pub struct ListenerHandle {
    shared: Arc<ListenerShared>,
    worker: Option<JoinHandle<Result<ListenerReport, ListenerError>>>,
    local_addr: SocketAddr,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn latest_snapshot(&self) -> Option<StampedSnapshot> {
        self.shared.slot.latest()
    }

    pub fn slot(&self) -> &SnapshotSlot {
        &self.shared.slot
    }

    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .is_none_or(|worker| worker.is_finished())
    }

    /// Unblocks any pending receive, waits for the worker and returns what it saw.
    pub fn stop(mut self) -> Result<ListenerReport, ListenerError> {
        self.signal_stop();
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| ListenerError::WorkerPanicked)?,
            None => Ok(ListenerReport::default()),
        }
    }

    fn signal_stop(&self) {
        self.shared.stopping.store(true, Ordering::SeqCst);
        self.shared.close_stream();
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.signal_stop();
        }
    }
}

fn serve(
    listener: TcpListener,
    shared: &ListenerShared,
    process_count: usize,
) -> Result<ListenerReport, ListenerError> {
    let mut report = ListenerReport::default();
    let Some((mut stream, peer)) = accept_one(&listener, shared)? else {
        return Ok(report);
    };
    drop(listener);
    report.peer = Some(peer);

    stream.set_nonblocking(false).map_err(ListenerError::Accept)?;
    let tracked = stream.try_clone().map_err(ListenerError::Accept)?;
    shared.track_stream(tracked);
    if shared.stopping() {
        shared.close_stream();
        return Ok(report);
    }

    let outcome = serve_connection(
        &mut stream,
        &shared.slot,
        &shared.stopping,
        process_count,
        &mut report,
    );
    shared.close_stream();
    let _ = stream.shutdown(Shutdown::Both);
    outcome.map(|_| report)
}

/// Waits for the single client, checking the stop flag between attempts.
fn accept_one(
    listener: &TcpListener,
    shared: &ListenerShared,
) -> Result<Option<(TcpStream, SocketAddr)>, ListenerError> {
    listener
        .set_nonblocking(true)
        .map_err(ListenerError::Accept)?;
    loop {
        if shared.stopping() {
            return Ok(None);
        }
        match listener.accept() {
            Ok(pair) => return Ok(Some(pair)),
            Err(error) if error.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_WAIT);
            }
            Err(error) if error.kind() == ErrorKind::Interrupted => {}
            Err(error) => return Err(ListenerError::Accept(error)),
        }
    }
}

/// Reads batches until the peer goes away, publishing each well-formed one and
/// acknowledging it with `OK`. Malformed batches get no reply.
pub(crate) fn serve_connection<S: Read + Write>(
    stream: &mut S,
    slot: &SnapshotSlot,
    stopping: &AtomicBool,
    process_count: usize,
    report: &mut ListenerReport,
) -> Result<(), ListenerError> {
    let mut buffer = [0u8; RECV_BLOCK_SIZE];
    loop {
        let read = match stream.read(&mut buffer) {
            Ok(read) => read,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) if is_disconnect(&error) || stopping.load(Ordering::SeqCst) => break,
            Err(error) => return Err(ListenerError::Receive(error)),
        };
        let text = String::from_utf8_lossy(&buffer[..read]);
        let line = trim_line(&text);
        if line.is_empty() {
            break;
        }

        let Ok(snapshot) = parse_status_batch(line, process_count) else {
            report.rejected += 1;
            continue;
        };
        slot.publish(snapshot);
        report.accepted += 1;
        match stream.write_all(ACKNOWLEDGEMENT).and_then(|_| stream.flush()) {
            Ok(()) => {}
            Err(error) if is_disconnect(&error) || stopping.load(Ordering::SeqCst) => break,
            Err(error) => return Err(ListenerError::Send(error)),
        }
    }
    Ok(())
}

fn is_disconnect(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
    )
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;

    use super::*;

    /// Replays scripted reads and records everything written back.
    struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
        write_error: Option<ErrorKind>,
    }

    impl ScriptedStream {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                written: Vec::new(),
                write_error: None,
            }
        }
    }

    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(error)) => Err(error),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if let Some(kind) = self.write_error {
                return Err(io::Error::from(kind));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(stream: &mut ScriptedStream, process_count: usize) -> (SnapshotSlot, ListenerReport) {
        let slot = SnapshotSlot::new();
        let stopping = AtomicBool::new(false);
        let mut report = ListenerReport::default();
        serve_connection(stream, &slot, &stopping, process_count, &mut report)
            .expect("serve connection");
        (slot, report)
    }

    #[test]
    fn acknowledges_each_well_formed_batch_once() {
        let mut stream = ScriptedStream::new(vec![
            Ok(b"A;READY;RUNNING|||B;-1;0\n".to_vec()),
            Ok(b"A;RUNNING;COMPLETE|||B;-1;0".to_vec()),
        ]);
        let (slot, report) = run(&mut stream, 2);
        assert_eq!(stream.written, b"OKOK");
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected, 0);
        let latest = slot.latest().expect("snapshot");
        assert_eq!(latest.generation, 2);
        assert_eq!(latest.snapshot.updates()[1].status, "COMPLETE");
    }

    #[test]
    fn malformed_batch_is_dropped_without_reply() {
        let mut stream = ScriptedStream::new(vec![
            Ok(b"A;READY|||B;0".to_vec()),
            Ok(b"justtext\r\n".to_vec()),
        ]);
        let (slot, report) = run(&mut stream, 1);
        assert_eq!(stream.written, b"OK");
        assert_eq!(report.accepted, 1);
        assert_eq!(report.rejected, 1);
        let latest = slot.latest().expect("snapshot");
        assert_eq!(latest.generation, 1);
        assert_eq!(latest.snapshot.updates()[0].status, "READY");
    }

    #[test]
    fn bare_newline_ends_the_session() {
        let mut stream = ScriptedStream::new(vec![
            Ok(b"\r\n".to_vec()),
            Ok(b"A;READY|||B;0".to_vec()),
        ]);
        let (slot, report) = run(&mut stream, 1);
        assert!(slot.latest().is_none());
        assert_eq!(report, ListenerReport::default());
        assert!(stream.written.is_empty());
    }

    #[test]
    fn connection_reset_ends_quietly() {
        let mut stream = ScriptedStream::new(vec![
            Ok(b"A;READY|||B;0".to_vec()),
            Err(io::Error::from(ErrorKind::ConnectionReset)),
            Ok(b"A;BLOCK|||B;0".to_vec()),
        ]);
        let (slot, report) = run(&mut stream, 1);
        assert_eq!(report.accepted, 1);
        let latest = slot.latest().expect("snapshot");
        assert_eq!(latest.snapshot.updates()[0].status, "READY");
    }

    #[test]
    fn broken_pipe_on_acknowledgement_ends_quietly() {
        let mut stream = ScriptedStream::new(vec![Ok(b"A;READY|||B;0".to_vec())]);
        stream.write_error = Some(ErrorKind::BrokenPipe);
        let (slot, report) = run(&mut stream, 1);
        assert_eq!(report.accepted, 1);
        assert!(slot.latest().is_some());
    }

    #[test]
    fn unexpected_receive_error_is_surfaced() {
        let mut stream = ScriptedStream::new(vec![Err(io::Error::from(
            ErrorKind::PermissionDenied,
        ))]);
        let slot = SnapshotSlot::new();
        let stopping = AtomicBool::new(false);
        let mut report = ListenerReport::default();
        let result = serve_connection(&mut stream, &slot, &stopping, 1, &mut report);
        assert!(matches!(result, Err(ListenerError::Receive(_))));
    }

    #[test]
    fn receive_error_after_stop_is_not_an_error() {
        let mut stream = ScriptedStream::new(vec![Err(io::Error::from(
            ErrorKind::PermissionDenied,
        ))]);
        let slot = SnapshotSlot::new();
        let stopping = AtomicBool::new(true);
        let mut report = ListenerReport::default();
        serve_connection(&mut stream, &slot, &stopping, 1, &mut report)
            .expect("stop suppresses receive errors");
    }
}
