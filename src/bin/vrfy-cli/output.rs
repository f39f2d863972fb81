use vrfy_probe::{Classification, VerificationAttempt, VerificationReport, VerifyError};

/// Line printed once the VRFY session finished, one way or another.
pub fn report_line(report: &VerificationReport) -> String {
    match &report.attempt {
        VerificationAttempt::Completed(outcome) => format!(
            "Verification result: {}, code {}, {}",
            outcome.classification, outcome.code, outcome.message
        ),
        VerificationAttempt::Aborted { message } => format!(
            "Error verifying {} with {}: {message}",
            report.email, report.exchange
        ),
    }
}

pub fn fatal_line(err: &VerifyError) -> String {
    format!("Error: {err}")
}

// codes de sortie : 0 succès (ou session interrompue), 2 échec VRFY, 1 fatal
pub fn exit_code(report: &VerificationReport) -> i32 {
    match &report.attempt {
        VerificationAttempt::Completed(outcome) => match outcome.classification {
            Classification::Success => 0,
            Classification::Failure => 2,
        },
        VerificationAttempt::Aborted { .. } => 0,
    }
}
