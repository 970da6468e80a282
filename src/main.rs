use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use sd_checkout::App;
use sd_checkout::Config;
use sd_checkout::config::Args;
use sd_checkout::ops::git::RealGit;
use tracing::level_filters::LevelFilter;

fn setup_logging() -> anyhow::Result<()> {
    let timer = tracing_subscriber::fmt::time::ChronoLocal::new("%H:%M:%S%.3f".into());
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()?;
    tracing_subscriber::fmt()
        .with_timer(timer)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if let Err(err) = setup_logging() {
        eprintln!("{}", format!("Invalid log filter: {err:#}").bright_red());
        return ExitCode::FAILURE;
    }

    let config = match Config::resolve(&args, |name| std::env::var(name).unwrap_or_default()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("CLI flags invalid: {err}").bright_red());
            return ExitCode::FAILURE;
        }
    };

    let app = App::new(config, RealGit::from_env());
    if let Err(err) = app
        .cmd_checkout(&mut std::io::stdout(), &mut std::io::stderr())
        .await
    {
        eprintln!("{}", format!("{err:#}").bright_red());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
