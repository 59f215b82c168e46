use clap::Parser;
use ocsp_check::{evaluate, ClientSettings, Config, Context};
use ocsp_eval::{read_chain, ChainError, EvaluationInput, EvaluationReport};
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Evaluate the OCSP responder of a certificate
///
/// Reads a PEM chain on stdin: the certificate (or precertificate) first,
/// then its issuer. Prints the evaluation as JSON on stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "ocsp-eval")]
struct Cli {
    /// User-Agent header sent to the responder
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// JSON file with HTTP client settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Give up after this many seconds (queries never exceed 10 seconds)
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut stdin = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut stdin) {
        eprintln!("Error reading certificate chain from stdin: {}", e);
        process::exit(1);
    }

    let input = match read_chain(&stdin).and_then(|chain| EvaluationInput::from_chain(&chain)) {
        Ok(input) => input,
        Err(e @ ChainError::TooFewCertificates(_)) => {
            eprintln!("{}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error reading certificate chain from stdin: {}", e);
            process::exit(1);
        }
    };

    let mut config = match &cli.config {
        Some(path) => match ClientSettings::from_file(path).and_then(|s| Config::from_settings(&s)) {
            Ok(config) => {
                debug!("Loaded client settings from {}", path.display());
                config
            }
            Err(e) => {
                eprintln!("Error loading client settings from {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(user_agent) = cli.user_agent {
        config = config.with_user_agent(user_agent);
    }

    let ctx = match cli.timeout_secs {
        Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)),
        None => Context::background(),
    };

    let evaluation = evaluate(
        &ctx,
        &input.cert,
        &input.issuer_subject,
        &input.issuer_spki,
        Some(&config),
    )
    .await;

    match EvaluationReport::from(&evaluation).to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding evaluation: {}", e);
            process::exit(1);
        }
    }
}
