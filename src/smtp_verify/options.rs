use std::borrow::Cow;
use std::time::Duration;

use super::types::Candidate;

/// Controls how [`probe_transport`](crate::smtp_verify::probe_transport)
/// walks the candidate ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Tried strictly in order; the first reachable one wins.
    pub candidates: Vec<Candidate>,
    pub connect_timeout: Duration,
    /// Pause between two failed candidates.
    pub pause: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            candidates: vec![Candidate::SUBMISSION, Candidate::SUBMISSIONS, Candidate::RELAY],
            connect_timeout: Duration::from_secs(10),
            pause: Duration::from_secs(2),
        }
    }
}

/// Configuration knobs for [`verify`](crate::smtp_verify::verify).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOptions {
    pub probe: ProbeOptions,
    pub helo_domain: Option<String>,
    /// Connect and read/write deadline of the VRFY session.
    pub session_timeout: Duration,
    /// Per-query deadline for the MX lookup.
    pub dns_timeout: Duration,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            probe: ProbeOptions::default(),
            helo_domain: None,
            session_timeout: Duration::from_secs(30),
            dns_timeout: Duration::from_secs(10),
        }
    }
}

impl VerifyOptions {
    /// Name announced in `EHLO`. Defaults to this machine's host name.
    pub fn helo_name(&self) -> Cow<'_, str> {
        match self
            .helo_domain
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(helo_from_hostname(gethostname::gethostname().to_str())),
        }
    }
}

/// Keeps a host name usable in `EHLO`, `localhost` otherwise.
pub(crate) fn helo_from_hostname(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|name| {
            !name.is_empty()
                && name
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.'))
        })
        .unwrap_or("localhost")
        .to_string()
}
