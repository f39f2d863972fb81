//! SMTP `VRFY` probing.
//!
//! [`verify`] resolves the mail exchange of an address, finds a reachable
//! port with [`probe_transport`], then opens a second session on that port to
//! issue `EHLO` and `VRFY` and classify the reply.

mod error;
mod options;
mod probe;
mod session;
mod types;
mod verify;

pub use error::{SmtpVerifyError, VerifyError};
pub use options::{ProbeOptions, VerifyOptions};
pub use probe::{Pause, ThreadSleep, probe_transport};
pub use session::{Dial, Dialogue, NetworkDialer, SmtpSession};
pub use types::{
    Candidate, Classification, SmtpReply, TransportMode, VerificationAttempt,
    VerificationOutcome, VerificationReport,
};
pub use verify::{verify, verify_with};
