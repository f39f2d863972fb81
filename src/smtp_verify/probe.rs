use std::time::Duration;

use super::error::SmtpVerifyError;
use super::options::ProbeOptions;
use super::session::Dial;
use super::types::Candidate;

/// Blocking wait between two probe candidates.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// [`Pause`] backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Finds the first candidate on which `host` accepts an SMTP session.
///
/// Each candidate gets one throwaway connection that is closed right away.
/// Expected failures (see [`SmtpVerifyError::is_expected_probe_failure`]) are
/// logged and followed by `options.pause` before the next candidate; any
/// other error stops probing and is returned. `Ok(None)` means every
/// candidate failed.
pub fn probe_transport<D, P>(
    host: &str,
    options: &ProbeOptions,
    dialer: &D,
    pause: &P,
) -> Result<Option<Candidate>, SmtpVerifyError>
where
    D: Dial + ?Sized,
    P: Pause + ?Sized,
{
    for (idx, candidate) in options.candidates.iter().enumerate() {
        if idx > 0 {
            pause.pause(options.pause);
        }
        match dialer.dial(host, *candidate, options.connect_timeout) {
            Ok(session) => {
                drop(session);
                tracing::info!(
                    mode = %candidate.mode,
                    "Successfully connected to {host} on port {}",
                    candidate.port
                );
                return Ok(Some(*candidate));
            }
            Err(err) if err.is_expected_probe_failure() => {
                tracing::warn!(
                    mode = %candidate.mode,
                    "Failed to connect to {host} on port {}: {err}",
                    candidate.port
                );
            }
            Err(err) => return Err(err),
        }
    }
    tracing::warn!(
        "all {} candidate ports failed for {host}",
        options.candidates.len()
    );
    Ok(None)
}
