use std::fmt;

/// How a connection to a candidate port reaches its usable state.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Plaintext connect, then EHLO + STARTTLS upgrade (submission, 587).
    StartTls,
    /// TLS from the first byte (submissions, 465).
    ImplicitTls,
    /// Plaintext, no upgrade (relay, 25).
    Plain,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartTls => f.write_str("starttls"),
            Self::ImplicitTls => f.write_str("implicit-tls"),
            Self::Plain => f.write_str("plain"),
        }
    }
}

/// A port together with the transport used on it.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub port: u16,
    pub mode: TransportMode,
}

impl Candidate {
    pub const SUBMISSION: Self = Self::new(587, TransportMode::StartTls);
    pub const SUBMISSIONS: Self = Self::new(465, TransportMode::ImplicitTls);
    pub const RELAY: Self = Self::new(25, TransportMode::Plain);

    pub const fn new(port: u16, mode: TransportMode) -> Self {
        Self { port, mode }
    }
}

/// A raw SMTP reply, preserving the numeric status code and message text.
/// Multi-line replies are joined with `\n`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn has_capability(&self, cap: &str) -> bool {
        self.message.lines().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| token.eq_ignore_ascii_case(cap))
        })
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Failure,
}

impl Classification {
    /// 250 (mailbox confirmed) and 252 (cannot verify, will accept) are both
    /// success; every other code is a failure.
    pub fn from_code(code: u16) -> Self {
        match code {
            250 | 252 => Self::Success,
            _ => Self::Failure,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("Success"),
            Self::Failure => f.write_str("Failure"),
        }
    }
}

/// Interpreted VRFY reply. Code and message are kept verbatim.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub code: u16,
    pub message: String,
    pub classification: Classification,
}

impl From<SmtpReply> for VerificationOutcome {
    fn from(reply: SmtpReply) -> Self {
        Self {
            classification: Classification::from_code(reply.code),
            code: reply.code,
            message: reply.message,
        }
    }
}

/// Result of the VRFY session. A session that broke off midway is not fatal:
/// it is reported as [`VerificationAttempt::Aborted`].
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationAttempt {
    Completed(VerificationOutcome),
    Aborted { message: String },
}

/// Everything [`verify`](crate::smtp_verify::verify) learned about one address.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub email: String,
    pub exchange: String,
    pub candidate: Candidate,
    pub attempt: VerificationAttempt,
}

impl VerificationReport {
    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        match &self.attempt {
            VerificationAttempt::Completed(outcome) => Some(outcome),
            VerificationAttempt::Aborted { .. } => None,
        }
    }
}
