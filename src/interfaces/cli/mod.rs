use std::path::PathBuf;

use clap::Parser;

use crate::io::format::crysym_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");
const HEADING_WIDTH: usize = 89;

/// Logs a nicely formatted `crysym` heading to the `crysym-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    let bar = "─".repeat(HEADING_WIDTH);
    crysym_output!("╭{bar}╮");
    crysym_output!("│{:^HEADING_WIDTH$}│", "");
    crysym_output!("│{:^HEADING_WIDTH$}│", "c r y s y m");
    crysym_output!("│{:^HEADING_WIDTH$}│", "");
    crysym_output!(
        "│{:^HEADING_WIDTH$}│",
        "Exact space-group symmetry of periodic structures"
    );
    crysym_output!("│{version:>w$} │", w = HEADING_WIDTH - 1);
    crysym_output!("╰{bar}╯");
    crysym_output!("");
}

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML input file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// The output file. If absent, output is written to standard output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Writes diagnostic messages to standard error.
    #[arg(short, long)]
    pub debug: bool,
}
