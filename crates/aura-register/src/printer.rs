//! Receipt printers.
//!
//! Most thermal printers accept raw bytes on TCP port 9100. Receipts are
//! sent as plain text; there is no ESC/POS formatting here.
//!
//! ```text
//! Register::checkout ──► render_receipt ──► PrintJob ──► NetworkPrinter
//!                                                           │
//!                              resolve host, TCP connect (5s) ┘ write_all, flush
//! ```
//!
//! Failures are returned once. Nothing retries.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, error, info, instrument, warn};

pub type PrintResult<T> = Result<T, PrintError>;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Printer offline: {0}")]
    Offline(String),

    #[error("Invalid printer config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that accepts print data.
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw bytes to the printer.
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is reachable.
    async fn is_online(&self) -> bool;
}

// =============================================================================
// Network Printer
// =============================================================================

/// A raw TCP printer. The host may be an IP or a name; names are resolved
/// on every connect so a printer that changes address is picked up.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    pub const DEFAULT_PORT: u16 = 9100;

    pub fn new(host: &str, port: u16) -> PrintResult<Self> {
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) || port == 0 {
            return Err(PrintError::InvalidConfig(format!(
                "Invalid address: {}:{}",
                host, port
            )));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(5),
        })
    }

    /// From an address string such as `"192.168.1.100:9100"` or
    /// `"printer.local:9100"`.
    pub fn from_addr(addr: &str) -> PrintResult<Self> {
        if let Ok(socket) = addr.parse::<SocketAddr>() {
            return Self::new(&socket.ip().to_string(), socket.port());
        }
        let invalid = || PrintError::InvalidConfig(format!("Invalid address: {}", addr));
        let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
        let port = port.parse().map_err(|_| invalid())?;
        Self::new(host, port)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the host and connects to the first address that answers.
    async fn connect(&self) -> PrintResult<TcpStream> {
        let addrs: Vec<SocketAddr> = lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.host, e)))?
            .collect();
        debug!(host = %self.host, resolved = addrs.len(), "printer address resolved");

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) => PrintError::Connection(format!("{}:{}: {}", self.host, self.port, e)),
            None => PrintError::Connection(format!("{}: no addresses", self.host)),
        })
    }
}

impl Printer for NetworkPrinter {
    #[instrument(skip(data), fields(host = %self.host, port = self.port, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let mut stream = tokio::time::timeout(self.timeout, self.connect())
            .await
            .map_err(|_| {
                PrintError::Timeout(format!("Connection timeout: {}:{}", self.host, self.port))
            })??;

        stream.write_all(data).await?;
        stream.flush().await?;

        info!("Print job sent");
        Ok(())
    }

    #[instrument(fields(host = %self.host, port = self.port))]
    async fn is_online(&self) -> bool {
        let check_timeout = Duration::from_millis(500);

        match tokio::time::timeout(check_timeout, self.connect()).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Printer offline");
                false
            }
            Err(_) => {
                warn!("Printer check timeout");
                false
            }
        }
    }
}

// =============================================================================
// Print Job
// =============================================================================

/// One fire-and-forget job: target address plus opaque content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJob {
    pub address: String,
    pub port: u16,
    pub content: Vec<u8>,
}

impl PrintJob {
    pub fn new(address: impl Into<String>, port: u16, content: impl Into<Vec<u8>>) -> Self {
        PrintJob {
            address: address.into(),
            port,
            content: content.into(),
        }
    }

    /// Opens a connection to the target and sends the content.
    pub async fn send(&self) -> PrintResult<()> {
        let printer = NetworkPrinter::new(&self.address, self.port)?;
        self.send_via(&printer).await
    }

    /// Sends the content through an already built printer.
    pub async fn send_via<P: Printer>(&self, printer: &P) -> PrintResult<()> {
        printer.print(&self.content).await.map_err(|e| {
            error!(address = %self.address, port = self.port, error = %e, "print job failed");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_address_forms() {
        assert!(matches!(
            NetworkPrinter::new("not an ip", 9100),
            Err(PrintError::InvalidConfig(_))
        ));
        assert!(NetworkPrinter::new("", 9100).is_err());
        assert!(NetworkPrinter::from_addr("printer.local").is_err());

        let printer = NetworkPrinter::from_addr("192.168.1.100:9100").unwrap();
        assert_eq!((printer.host(), printer.port()), ("192.168.1.100", 9100));
        let printer = NetworkPrinter::new("printer.local", NetworkPrinter::DEFAULT_PORT).unwrap();
        assert_eq!(printer.host(), "printer.local");
        let printer = NetworkPrinter::from_addr("kitchen-printer:9101").unwrap();
        assert_eq!((printer.host(), printer.port()), ("kitchen-printer", 9101));
        let printer = NetworkPrinter::from_addr("[::1]:9100").unwrap();
        assert_eq!(printer.host(), "::1");
    }

    #[tokio::test]
    async fn test_hostname_resolved_at_print_time() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let job = PrintJob::new("localhost", port, "Order #2\n");
        job.send().await.unwrap();

        assert_eq!(server.await.unwrap(), b"Order #2\n");
    }

    #[tokio::test]
    async fn test_print_sends_bytes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let job = PrintJob::new("127.0.0.1", addr.port(), "Order #1\n");
        job.send().await.unwrap();

        assert_eq!(server.await.unwrap(), b"Order #1\n");
    }

    #[tokio::test]
    async fn test_online_check() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let printer = NetworkPrinter::from_addr(&addr.to_string()).unwrap();
        assert!(printer.is_online().await);
        assert!(NetworkPrinter::new("localhost", addr.port()).unwrap().is_online().await);

        drop(listener);
        assert!(!printer.is_online().await);
    }

    #[tokio::test]
    async fn test_closed_port_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = PrintJob::new("127.0.0.1", port, "x").send().await.unwrap_err();
        assert!(matches!(err, PrintError::Connection(_) | PrintError::Timeout(_)));
    }
}
