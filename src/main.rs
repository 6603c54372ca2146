use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sa_token_verify::{Verifier, VerifierConfig, DEFAULT_JWK_ENDPOINT};
use tracing_subscriber::EnvFilter;

/// Verify a service account JWT against the issuer's published keys and print its claims.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The compact JWT to verify
    token: String,

    /// Key distribution endpoint; the token's issuer is appended to it
    #[arg(long, default_value = DEFAULT_JWK_ENDPOINT)]
    endpoint: String,

    /// Seconds to wait for the key set
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Allowed clock skew in seconds for exp and nbf
    #[arg(long, default_value_t = 0)]
    leeway: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = VerifierConfig::default()
        .with_jwk_endpoint(args.endpoint)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_leeway(args.leeway);

    let verifier = match Verifier::new(config) {
        Ok(verifier) => verifier,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match verifier.verify_token(&args.token).await {
        Ok(claims) => match serde_json::to_string_pretty(&claims) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("could not print claims: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
