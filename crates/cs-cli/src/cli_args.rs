use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cutscript-player")]
#[command(about = "Headless player for cutscene scripts")]
pub(crate) struct Cli {
    /// Log engine activity (debug level) to stderr.
    #[arg(long, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Play(PlayArgs),
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
    #[arg(long = "entry")]
    pub(crate) entry: Option<String>,
    #[arg(long = "frames", default_value_t = 600)]
    pub(crate) frames: usize,
    #[arg(long = "frame-ms", default_value_t = 16.0)]
    pub(crate) frame_ms: f64,
    /// JSON file with executor settings.
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    /// `name=value`, resolved once something waits on `name`.
    #[arg(long = "event", value_parser = parse_event_arg)]
    pub(crate) events: Vec<(String, String)>,
    #[arg(long = "parallel-in")]
    pub(crate) parallel_in: Option<String>,
    #[arg(long = "parallel-out")]
    pub(crate) parallel_out: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: String,
}

pub(crate) fn parse_event_arg(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got \"{}\"", raw)),
    }
}
