pub mod config;
pub mod listener;
pub mod pipeline;
pub mod runner;
pub mod signals;
pub mod tui;
pub mod ui;

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunArgs {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tick_ms: Option<u64>,
    pub margin: Option<u16>,
    pub pipeline: Option<String>,
    pub output_json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliParseError {
    MissingValue(String),
    InvalidNumber { flag: String, value: String },
    UnknownArgument(String),
}

impl std::fmt::Display for CliParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliParseError::MissingValue(flag) => write!(f, "{flag} requires a value"),
            CliParseError::InvalidNumber { flag, value } => {
                write!(f, "{flag} expects a number, got `{value}`")
            }
            CliParseError::UnknownArgument(arg) => write!(f, "unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliParseError {}

pub fn parse_command<I>(args: I) -> Result<Command, CliParseError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut run = RunArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--config" => run.config_path = Some(PathBuf::from(flag_value(&mut args, &arg)?)),
            "--host" => run.host = Some(flag_value(&mut args, &arg)?),
            "--port" => run.port = Some(flag_number(&mut args, &arg)?),
            "--tick-ms" => run.tick_ms = Some(flag_number(&mut args, &arg)?),
            "--margin" => run.margin = Some(flag_number(&mut args, &arg)?),
            "--pipeline" => run.pipeline = Some(flag_value(&mut args, &arg)?),
            "--json" => run.output_json = true,
            other => return Err(CliParseError::UnknownArgument(other.to_owned())),
        }
    }

    Ok(Command::Run(run))
}

fn flag_value<I>(args: &mut I, flag: &str) -> Result<String, CliParseError>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| CliParseError::MissingValue(flag.to_owned()))
}

fn flag_number<I, T>(args: &mut I, flag: &str) -> Result<T, CliParseError>
where
    I: Iterator<Item = String>,
    T: std::str::FromStr,
{
    let value = flag_value(args, flag)?;
    value
        .parse::<T>()
        .map_err(|_| CliParseError::InvalidNumber {
            flag: flag.to_owned(),
            value,
        })
}

pub fn print_usage() {
    eprintln!(
        "processview\n\nUSAGE:\n  processview [OPTIONS]\n\nOPTIONS:\n  --config <PATH>      Load settings from a TOML file\n  --host <HOST>        Address the status listener binds (default 127.0.0.1)\n  --port <PORT>        Port the status listener binds (default 8888)\n  --tick-ms <MS>       Poll interval of the dashboard loop (default 50)\n  --margin <CELLS>     Gap between status boxes (default 4)\n  --pipeline <LIST>    Encoded process list instead of $PROCESSVIEW_PIPELINE\n  --json               Print the exit summary as JSON\n  -h, --help           Print help\n\nENVIRONMENT:\n  PROCESSVIEW_PIPELINE     name###meta:::name###meta ... (one entry per process)\n  PROCESSVIEW_HOST/PORT    Listener address overrides\n  PROCESSVIEW_TICK_MS      Poll interval override\n  PROCESSVIEW_MARGIN       Box gap override\n  PROCESSVIEW_DIAGNOSTICS  Set to 1 to print loop diagnostics on exit\n  PROCESSVIEW_COLOR        always | never | auto\n"
    );
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
