use std::process;

use anyhow::{self, format_err};
use clap::Parser;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crysym::interfaces::cli::{log_heading, Cli};
use crysym::interfaces::input::Input;
use crysym::interfaces::InputHandle;
use crysym::io::read_crysym_yaml;

const OUTPUT_TARGET: &str = "crysym-output";

/// Configures `log4rs` so that the `crysym-output` target goes to the requested output file (or
/// standard output) and every other record goes to standard error.
fn init_logging(cli: &Cli) -> Result<(), anyhow::Error> {
    let output_appender: Box<dyn log4rs::append::Append> = match cli.output.as_ref() {
        Some(path) => Box::new(
            FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .append(false)
                .build(path)?,
        ),
        None => Box::new(
            ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new("{m}{n}")))
                .target(Target::Stdout)
                .build(),
        ),
    };
    let diagnostic_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}",
        )))
        .target(Target::Stderr)
        .build();
    let root_level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let config = Config::builder()
        .appender(Appender::builder().build("output", output_appender))
        .appender(Appender::builder().build("diagnostics", Box::new(diagnostic_appender)))
        .logger(
            Logger::builder()
                .appender("output")
                .additive(false)
                .build(OUTPUT_TARGET, LevelFilter::Info),
        )
        .build(Root::builder().appender("diagnostics").build(root_level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), anyhow::Error> {
    init_logging(cli)?;
    log_heading();
    let input: Input = read_crysym_yaml(&cli.config)
        .map_err(|err| format_err!("Unable to read {}: {err}", cli.config.display()))?;
    input.handle()
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        log::error!(target: OUTPUT_TARGET, "{err}");
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
