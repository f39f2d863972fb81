use clap::Parser;

/// Verify an email address via SMTP.
#[derive(Parser)]
#[command(name = "vrfy-cli")]
pub struct Cli {
    /// adresse e-mail à vérifier
    pub email: String,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
