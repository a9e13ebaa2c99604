//! Constant-response HTTP endpoint.
//!
//! Binds to 127.0.0.1:<random_port> and answers every request, whatever its
//! method, path or headers, with `200 OK` and the same body.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Content type of every response: the payload is unstructured text.
pub const CONTENT_TYPE: &str = "text/plain; charset=ISO-8859-1";

/// Request heads larger than this are cut off and answered anyway.
const MAX_REQUEST_HEAD: usize = 64 * 1024;

const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// A running stub. Stopped by [`StubEndpoint::stop`] or on drop; once
/// stopped its address refuses connections.
pub struct StubEndpoint {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    listener_handle: Option<JoinHandle<()>>,
}

impl StubEndpoint {
    /// Start serving `body`.
    pub fn start(body: impl Into<Vec<u8>>) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;

        // Non-blocking so the loop can see the shutdown flag
        listener.set_nonblocking(true)?;

        let body: Vec<u8> = body.into();
        let body: Arc<[u8]> = Arc::from(body);
        let shutdown = Arc::new(AtomicBool::new(false));
        let requests = Arc::new(AtomicUsize::new(0));

        let listener_handle = {
            let shutdown = Arc::clone(&shutdown);
            let requests = Arc::clone(&requests);
            thread::spawn(move || run_listener(listener, shutdown, body, requests))
        };

        log::info!("Stub endpoint started on {}", addr);

        Ok(Self {
            addr,
            shutdown,
            requests,
            listener_handle: Some(listener_handle),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// `http://127.0.0.1:<port>`, suitable as a module host.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests answered so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.listener_handle.is_some() && !self.shutdown.load(Ordering::SeqCst)
    }

    /// Stop accepting and release the port. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.listener_handle.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::SeqCst);
        // The listener socket is owned by the thread and closes when it exits
        if handle.join().is_err() {
            log::warn!("Stub endpoint listener on {} panicked", self.addr);
        }

        log::info!(
            "Stub endpoint on {} stopped after {} request(s)",
            self.addr,
            self.request_count()
        );
    }
}

impl Drop for StubEndpoint {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for StubEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StubEndpoint")
            .field("addr", &self.addr)
            .field("running", &self.is_running())
            .field("requests", &self.request_count())
            .finish()
    }
}

fn run_listener(
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    body: Arc<[u8]>,
    requests: Arc<AtomicUsize>,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                log::debug!("Stub accepted connection from {}", peer);
                let body = Arc::clone(&body);
                let requests = Arc::clone(&requests);
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &body, &requests) {
                        log::warn!("Stub connection error from {}: {}", peer, e);
                    }
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                log::error!("Stub accept error: {}", e);
                break;
            }
        }
    }
}

fn handle_connection(
    mut stream: TcpStream,
    body: &[u8],
    requests: &AtomicUsize,
) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.set_write_timeout(Some(Duration::from_secs(10)))?;

    read_request_head(&mut stream)?;
    requests.fetch_add(1, Ordering::SeqCst);

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        CONTENT_TYPE,
        body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;
    stream.flush()?;
    // Peer may already be gone; the response is out either way
    let _ = stream.shutdown(Shutdown::Write);
    Ok(())
}

/// Consume the request line and headers. The content is never looked at.
fn read_request_head(stream: &mut TcpStream) -> io::Result<()> {
    let mut head = Vec::with_capacity(1024);
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") || head.len() >= MAX_REQUEST_HEAD {
            return Ok(());
        }
    }
}
