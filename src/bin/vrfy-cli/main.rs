use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use vrfy_probe::{VerifyOptions, verify};

mod args;
mod output;

use args::Cli;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|err| anyhow!("logging setup failed: {err}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match verify(&cli.email, &VerifyOptions::default()) {
        Ok(report) => {
            println!("{}", output::report_line(&report));
            let code = output::exit_code(&report);
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            println!("{}", output::fatal_line(&err));
            std::process::exit(1);
        }
    }
}
