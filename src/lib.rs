#![forbid(unsafe_code)]
//! vrfy_probe — vérification d'existence d'une adresse e-mail (MX + SMTP VRFY)

pub mod mx;
pub mod smtp_verify;

pub use mx::{Error as MxError, LookupMx, MxRecord, build_resolver, resolve_mail_exchange};
pub use smtp_verify::{
    Candidate, Classification, Dial, Dialogue, NetworkDialer, Pause, ProbeOptions, SmtpReply,
    SmtpVerifyError, ThreadSleep, TransportMode, VerificationAttempt, VerificationOutcome,
    VerificationReport, VerifyError, VerifyOptions, probe_transport, verify, verify_with,
};
