use std::io;

use thiserror::Error;

use crate::mx::Error as MxError;

/// Failures of a single SMTP session (probe or verification).
#[derive(Debug, Error)]
pub enum SmtpVerifyError {
    #[error("could not resolve {host}: {source}")]
    AddressResolution {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
    #[error("TLS handshake failed: {source}")]
    Tls {
        #[source]
        source: native_tls::Error,
    },
    #[error("{host} did not answer with an SMTP greeting: {greeting}")]
    NotSmtp { host: String, greeting: String },
    #[error("malformed SMTP reply: {line}")]
    MalformedReply { line: String },
    #[error("server refused the connection: {code} {message}")]
    Greeting { code: u16, message: String },
    #[error("STARTTLS extension not supported by {host}")]
    StartTlsUnavailable { host: String },
    #[error("STARTTLS rejected: {code} {message}")]
    StartTlsRejected { code: u16, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl SmtpVerifyError {
    pub(crate) fn io(source: io::Error) -> Self {
        Self::Io { source }
    }

    /// Failures the prober absorbs before moving to the next candidate:
    /// refused or timed out connections, abrupt disconnects, and a greeting
    /// that is not 220 or not SMTP at all. Anything else aborts probing.
    pub fn is_expected_probe_failure(&self) -> bool {
        match self {
            Self::Connect { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::WouldBlock
            ),
            Self::Io { source } => is_disconnect_or_timeout(source.kind()),
            Self::Greeting { .. } | Self::NotSmtp { .. } => true,
            _ => false,
        }
    }
}

fn is_disconnect_or_timeout(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::TimedOut
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

/// Conditions that end a verification run before any VRFY is attempted.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("error fetching MX record for domain {domain}: {source}")]
    Resolution {
        domain: String,
        #[source]
        source: MxError,
    },
    #[error(
        "unable to connect to {host} on any common SMTP ports. \
         Please check the server status or your network."
    )]
    Connectivity { host: String },
    #[error("SMTP client setup failed: {source}")]
    Setup {
        #[source]
        source: SmtpVerifyError,
    },
    #[error("probing {host} failed: {source}")]
    Probe {
        host: String,
        #[source]
        source: SmtpVerifyError,
    },
}

impl VerifyError {
    pub(crate) fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}
