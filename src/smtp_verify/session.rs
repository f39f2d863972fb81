use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use native_tls::{HandshakeError, TlsConnector, TlsStream};

use super::error::SmtpVerifyError;
use super::types::{Candidate, SmtpReply, TransportMode};

/// Opens SMTP sessions already in the state their candidate requires:
/// greeting read, and for STARTTLS candidates the upgrade completed.
/// Dropping the session closes the connection.
pub trait Dial {
    type Session: Dialogue;

    fn dial(
        &self,
        host: &str,
        candidate: Candidate,
        timeout: Duration,
    ) -> Result<Self::Session, SmtpVerifyError>;
}

/// Commands issued on an established session.
pub trait Dialogue {
    fn ehlo(&mut self, helo: &str) -> Result<SmtpReply, SmtpVerifyError>;
    fn vrfy(&mut self, address: &str) -> Result<SmtpReply, SmtpVerifyError>;
    fn quit(&mut self) -> Result<(), SmtpVerifyError>;
}

/// [`Dial`] implementation backed by real TCP sockets and `native-tls`.
pub struct NetworkDialer {
    connector: TlsConnector,
    helo: String,
}

impl NetworkDialer {
    /// The TLS connector accepts any certificate and hostname: MX hosts
    /// routinely present self-signed or mismatched certificates.
    pub fn new(helo: impl Into<String>) -> Result<Self, SmtpVerifyError> {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|err| SmtpVerifyError::Tls { source: err })?;
        Ok(Self {
            connector,
            helo: helo.into(),
        })
    }
}

impl Dial for NetworkDialer {
    type Session = SmtpSession;

    fn dial(
        &self,
        host: &str,
        candidate: Candidate,
        timeout: Duration,
    ) -> Result<SmtpSession, SmtpVerifyError> {
        let addrs = resolve_addrs(host, candidate.port)?;
        let mut session = SmtpSession::connect(host, candidate.port, &addrs, timeout)?;

        if candidate.mode == TransportMode::ImplicitTls {
            session.stream.upgrade_tls(host, &self.connector)?;
        }

        let greeting = session.read_reply().map_err(|err| match err {
            SmtpVerifyError::MalformedReply { line } => SmtpVerifyError::NotSmtp {
                host: host.to_string(),
                greeting: line,
            },
            other => other,
        })?;
        if greeting.code != 220 {
            return Err(SmtpVerifyError::Greeting {
                code: greeting.code,
                message: greeting.message,
            });
        }

        if candidate.mode == TransportMode::StartTls {
            session.starttls(&self.helo, &self.connector)?;
        }
        Ok(session)
    }
}

fn resolve_addrs(host: &str, port: u16) -> Result<Vec<SocketAddr>, SmtpVerifyError> {
    (host, port)
        .to_socket_addrs()
        .map(|iter| iter.collect())
        .map_err(|err| SmtpVerifyError::AddressResolution {
            host: host.to_string(),
            source: err,
        })
}

#[derive(Debug)]
enum StreamState {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Invalid,
}

#[derive(Debug)]
struct SmtpStream {
    state: StreamState,
    buffer: Vec<u8>,
}

impl SmtpStream {
    fn new(stream: TcpStream) -> Self {
        Self {
            state: StreamState::Plain(stream),
            buffer: Vec::new(),
        }
    }

    fn upgrade_tls(
        &mut self,
        domain: &str,
        connector: &TlsConnector,
    ) -> Result<(), SmtpVerifyError> {
        let plain = match std::mem::replace(&mut self.state, StreamState::Invalid) {
            StreamState::Plain(stream) => stream,
            StreamState::Tls(stream) => {
                self.state = StreamState::Tls(stream);
                return Ok(());
            }
            StreamState::Invalid => {
                return Err(SmtpVerifyError::Protocol("invalid stream state".into()));
            }
        };
        // bytes buffered before the handshake belong to the plaintext phase
        self.buffer.clear();
        let tls = complete_handshake(connector, domain, plain)?;
        self.state = StreamState::Tls(Box::new(tls));
        Ok(())
    }

    fn send_command(&mut self, command: &str) -> Result<(), SmtpVerifyError> {
        if command.contains(['\r', '\n']) {
            return Err(SmtpVerifyError::Protocol(format!(
                "line break in command {command:?}"
            )));
        }
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        let result = match &mut self.state {
            StreamState::Plain(stream) => stream.write_all(&data).and_then(|()| stream.flush()),
            StreamState::Tls(stream) => stream.write_all(&data).and_then(|()| stream.flush()),
            StreamState::Invalid => {
                return Err(SmtpVerifyError::Protocol("invalid stream state".into()));
            }
        };
        result.map_err(SmtpVerifyError::io)
    }

    fn read_reply(&mut self) -> Result<SmtpReply, SmtpVerifyError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = parse_reply_line(&self.read_line()?)?;
            let parsed_code = line.code;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(SmtpVerifyError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            lines.push(line.text);
            if line.last {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or_default(),
            message: lines.join("\n"),
        })
    }

    fn read_line(&mut self) -> Result<Vec<u8>, SmtpVerifyError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                if line.ends_with(b"\r\n") {
                    line.truncate(line.len() - 2);
                } else {
                    line.truncate(line.len() - 1);
                }
                return Ok(line);
            }

            let mut buf = [0u8; 512];
            let read = match &mut self.state {
                StreamState::Plain(stream) => stream.read(&mut buf),
                StreamState::Tls(stream) => stream.read(&mut buf),
                StreamState::Invalid => {
                    return Err(SmtpVerifyError::Protocol("invalid stream state".into()));
                }
            };
            let read = read.map_err(SmtpVerifyError::io)?;
            if read == 0 {
                return Err(SmtpVerifyError::io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ReplyLine {
    code: u16,
    last: bool,
    text: String,
}

/// Splits one raw reply line into code, continuation marker and text.
/// Servers are not bound to UTF-8: the text is decoded lossily, after the
/// code and separator have been cut off at byte level.
fn parse_reply_line(raw: &[u8]) -> Result<ReplyLine, SmtpVerifyError> {
    let code = raw
        .get(..3)
        .filter(|digits| digits.iter().all(u8::is_ascii_digit))
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .and_then(|digits| digits.parse::<u16>().ok())
        .ok_or_else(|| SmtpVerifyError::MalformedReply {
            line: String::from_utf8_lossy(raw).into_owned(),
        })?;
    Ok(ReplyLine {
        code,
        last: raw.get(3) != Some(&b'-'),
        text: String::from_utf8_lossy(raw.get(4..).unwrap_or_default()).into_owned(),
    })
}

fn complete_handshake(
    connector: &TlsConnector,
    domain: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, SmtpVerifyError> {
    match connector.connect(domain, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(err)) => Err(SmtpVerifyError::Tls { source: err }),
        Err(HandshakeError::WouldBlock(mut mid)) => loop {
            match mid.handshake() {
                Ok(tls) => break Ok(tls),
                Err(HandshakeError::Failure(err)) => {
                    break Err(SmtpVerifyError::Tls { source: err });
                }
                Err(HandshakeError::WouldBlock(next)) => mid = next,
            }
        },
    }
}

/// An open SMTP connection to one host and port.
#[derive(Debug)]
pub struct SmtpSession {
    host: String,
    stream: SmtpStream,
}

impl SmtpSession {
    fn connect(
        host: &str,
        port: u16,
        addresses: &[SocketAddr],
        timeout: Duration,
    ) -> Result<Self, SmtpVerifyError> {
        let mut last_err = None;
        for addr in addresses {
            match TcpStream::connect_timeout(addr, timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(timeout))
                        .map_err(SmtpVerifyError::io)?;
                    stream
                        .set_write_timeout(Some(timeout))
                        .map_err(SmtpVerifyError::io)?;
                    tracing::debug!(host, %addr, "connected");
                    return Ok(Self {
                        host: host.to_string(),
                        stream: SmtpStream::new(stream),
                    });
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(SmtpVerifyError::Connect {
            host: host.to_string(),
            port,
            source: last_err.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::AddrNotAvailable, "no socket address available")
            }),
        })
    }

    fn read_reply(&mut self) -> Result<SmtpReply, SmtpVerifyError> {
        let reply = self.stream.read_reply()?;
        tracing::debug!(host = %self.host, "S: {} {}", reply.code, reply.message);
        Ok(reply)
    }

    fn command(&mut self, command: &str) -> Result<SmtpReply, SmtpVerifyError> {
        tracing::debug!(host = %self.host, "C: {command}");
        self.stream.send_command(command)?;
        self.read_reply()
    }

    fn starttls(&mut self, helo: &str, connector: &TlsConnector) -> Result<(), SmtpVerifyError> {
        let ehlo = self.ehlo(helo)?;
        if !ehlo.has_capability("STARTTLS") {
            return Err(SmtpVerifyError::StartTlsUnavailable {
                host: self.host.clone(),
            });
        }
        let reply = self.command("STARTTLS")?;
        if reply.code != 220 {
            return Err(SmtpVerifyError::StartTlsRejected {
                code: reply.code,
                message: reply.message,
            });
        }
        let host = self.host.clone();
        self.stream.upgrade_tls(&host, connector)
    }
}

impl Dialogue for SmtpSession {
    fn ehlo(&mut self, helo: &str) -> Result<SmtpReply, SmtpVerifyError> {
        self.command(&format!("EHLO {helo}"))
    }

    fn vrfy(&mut self, address: &str) -> Result<SmtpReply, SmtpVerifyError> {
        self.command(&format!("VRFY {address}"))
    }

    fn quit(&mut self) -> Result<(), SmtpVerifyError> {
        self.command("QUIT").map(|_| ())
    }
}
