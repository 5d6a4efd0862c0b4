use clap::Parser;
use promify::{
    ensure_piped,
    read_all,
    Cli,
    Result,
};
use std::{
    io,
    process::ExitCode,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,promify=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config()?;

    let stdin = io::stdin();
    ensure_piped(&stdin)?;
    let data = read_all(stdin.lock())?;

    let path = config.output_path();
    config.format.convert(&data, &path, config.tag())?;
    debug!(path = %path.display(), format = %config.format, "done");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("promify: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
