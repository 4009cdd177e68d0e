// Entrypoint for the CLI application.
// - Keeps `main` small: parse args, run the upload, report the outcome.
// - The two expected failures get a clean message and exit status 1; any
//   other error is returned and printed by the runtime.

use clap::Parser;
use dropbox_upload::{cli::Args, config::Config, upload};
use env_logger::Env;
use std::process;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let token = args.resolve_token()?;
    let config = Config::from_env();

    match upload(&args.path, &token, &config) {
        Ok(_) => Ok(()),
        Err(err) => match err.diagnostic() {
            Some(message) => {
                log::debug!("{}", err);
                eprintln!("{}", message);
                process::exit(1);
            }
            None => Err(err.into()),
        },
    }
}
