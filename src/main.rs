use std::process::ExitCode;

use clap::Parser;
use proxy_headers::config::RunnerConfig;
use proxy_headers::runner::Runner;

/// Check that a proxy returns the expected header through a CONNECT tunnel.
///
/// Configuration is read from the environment: PROXY_URL or HTTPS_PROXY (required),
/// TEST_URL, PROXY_HEADER, SEND_PROXY_HEADER, SEND_PROXY_VALUE and PROXY_TIMEOUT.
#[derive(Debug, Parser)]
#[command(name = "test-proxy-headers", version)]
struct Cli {
    /// Print the value of the received header.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match RunnerConfig::from_env() {
        Ok(config) => config.verbose(cli.verbose),
        Err(err) => {
            println!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let runner = Runner::new(config);
    println!("{}", runner.banner());

    let result = runner.run();
    println!("{}", runner.report(&result));

    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
