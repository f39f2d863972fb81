use crate::mx::{self, LookupMx};

use super::error::{SmtpVerifyError, VerifyError};
use super::options::VerifyOptions;
use super::probe::{Pause, ThreadSleep, probe_transport};
use super::session::{Dial, Dialogue, NetworkDialer};
use super::types::{Candidate, VerificationAttempt, VerificationOutcome, VerificationReport};

/// Checks `email` against its domain's mail exchange with `VRFY`, using the
/// system resolver, real sockets and real pauses.
///
/// Only the fatal paths (bad input, MX resolution, no reachable port) are
/// returned as errors. A VRFY session that breaks off is reported inside the
/// [`VerificationReport`].
pub fn verify(email: &str, options: &VerifyOptions) -> Result<VerificationReport, VerifyError> {
    let domain = extract_domain(email.trim())?;
    let resolver = mx::build_resolver(Some(options.dns_timeout)).map_err(|source| {
        VerifyError::Resolution {
            domain: domain.to_string(),
            source,
        }
    })?;
    let dialer = NetworkDialer::new(options.helo_name())
        .map_err(|source| VerifyError::Setup { source })?;
    verify_with(email, options, &resolver, &dialer, &ThreadSleep)
}

/// Same as [`verify`] with every collaborator injected.
pub fn verify_with<R, D, P>(
    email: &str,
    options: &VerifyOptions,
    resolver: &R,
    dialer: &D,
    pause: &P,
) -> Result<VerificationReport, VerifyError>
where
    R: LookupMx + ?Sized,
    D: Dial + ?Sized,
    P: Pause + ?Sized,
{
    let email = email.trim();
    let domain = extract_domain(email)?;

    let exchange =
        mx::resolve_mail_exchange(resolver, domain).map_err(|source| VerifyError::Resolution {
            domain: domain.to_string(),
            source,
        })?;

    let candidate = probe_transport(&exchange, &options.probe, dialer, pause)
        .map_err(|source| VerifyError::Probe {
            host: exchange.clone(),
            source,
        })?
        .ok_or_else(|| VerifyError::Connectivity {
            host: exchange.clone(),
        })?;

    // fresh connection: the probe session is never reused
    let attempt = match run_vrfy(dialer, &exchange, candidate, email, options) {
        Ok(outcome) => {
            tracing::info!(
                code = outcome.code,
                "{email} classified as {} by {exchange}:{}",
                outcome.classification,
                candidate.port
            );
            VerificationAttempt::Completed(outcome)
        }
        Err(err) => {
            tracing::warn!(
                "VRFY session with {exchange}:{} aborted: {err}",
                candidate.port
            );
            VerificationAttempt::Aborted {
                message: err.to_string(),
            }
        }
    };

    Ok(VerificationReport {
        email: email.to_string(),
        exchange,
        candidate,
        attempt,
    })
}

fn run_vrfy<D>(
    dialer: &D,
    host: &str,
    candidate: Candidate,
    email: &str,
    options: &VerifyOptions,
) -> Result<VerificationOutcome, SmtpVerifyError>
where
    D: Dial + ?Sized,
{
    let mut session = dialer.dial(host, candidate, options.session_timeout)?;

    let ehlo = session.ehlo(&options.helo_name())?;
    if !ehlo.is_positive_completion() {
        tracing::warn!("EHLO rejected by {host}: {} {}", ehlo.code, ehlo.message);
    }

    let outcome = VerificationOutcome::from(session.vrfy(email)?);

    if let Err(err) = session.quit() {
        tracing::debug!("QUIT to {host} failed after VRFY: {err}");
    }
    Ok(outcome)
}

pub(crate) fn extract_domain(email: &str) -> Result<&str, VerifyError> {
    if email.contains(['\r', '\n']) {
        return Err(VerifyError::invalid_address(email, "line break in address"));
    }
    let (_, domain) = email
        .split_once('@')
        .ok_or_else(|| VerifyError::invalid_address(email, "missing '@'"))?;
    if domain.trim().is_empty() {
        return Err(VerifyError::invalid_address(email, "empty domain"));
    }
    Ok(domain)
}
