use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use spdlog::{error, warn};

use post2html::converter::{Converter, Summary};
use post2html::logger::configure_logger;

use crate::config::open_config;

mod config;

const CFG_FILE_NAME: &str = "post2html.toml";

const EXIT_OK: u8 = 0;
/// Some posts of a batch failed
const EXIT_PARTIAL: u8 = 1;
/// Nothing could be converted
const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(version, about = "Converts saved post data into standalone HTML pages", long_about = None)]
struct Args {
    /// A post directory, or a directory containing post directories
    path: PathBuf,

    /// Config path
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Template used instead of the built-in one
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Stop converting a batch at the first failing post
    #[arg(long)]
    fail_fast: bool,

    /// Log what is being done
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> Result<Summary> {
    let mut config = open_config(args.config_path.clone()).map_err(anyhow::Error::msg)?;

    if let Some(ref template) = args.template {
        config.paths.template = Some(template.clone());
    }
    if args.fail_fast {
        config.batch.fail_fast = true;
    }

    if let Err(err) = configure_logger(&config, args.verbose) {
        warn!("Error creating logger sinks. Using console instead. Desc={}", err);
    }

    let converter = Converter::from_config(&config).context("Could not prepare the page template")?;
    let summary = converter.run(&args.path)?;

    Ok(summary)
}

fn exit_status(outcome: &Result<Summary>) -> u8 {
    match outcome {
        Ok(summary) if summary.is_success() => EXIT_OK,
        Ok(_) => EXIT_PARTIAL,
        Err(_) => EXIT_FATAL,
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let outcome = run(&args);
    match outcome {
        Ok(ref summary) => summary.log(),
        Err(ref err) => error!("{:#}", err),
    }

    spdlog::default_logger().flush();
    ExitCode::from(exit_status(&outcome))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use post2html::error::ConvertError;

    use super::*;

    #[test]
    fn test_exit_status() {
        let converted = Summary { batch: true, converted: vec![PathBuf::from("a/post.html")], ..Summary::default() };
        assert_eq!(exit_status(&Ok(converted)), EXIT_OK);

        let partial = Summary {
            batch: true,
            failures: vec![ConvertError::parse(&PathBuf::from("posts/broken-1"), "bad json")],
            ..Summary::default()
        };
        assert_eq!(exit_status(&Ok(partial)), EXIT_PARTIAL);

        let fatal = Err(anyhow::Error::from(ConvertError::InvalidPath(PathBuf::from("nope"))));
        assert_eq!(exit_status(&fatal), EXIT_FATAL);
    }

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["post2html", "--fail-fast", "-v", "-c", "conf.toml", "posts"]).unwrap();
        assert_eq!(args.path, PathBuf::from("posts"));
        assert_eq!(args.config_path, Some(PathBuf::from("conf.toml")));
        assert!(args.fail_fast);
        assert!(args.verbose);
        assert!(args.template.is_none());

        assert!(Args::try_parse_from(["post2html"]).is_err());
    }
}
