//! Argument parsing and command dispatch for the `folio` binary.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use folio_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, TelemetryError, init_logging,
};

use crate::commands::plan::handle_plan;
use crate::commands::replay::handle_replay;
use crate::error::{CliError, CliResult};

/// Parses CLI arguments, installs logging, and executes the requested command.
/// Returns the process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: cli.log_format,
        build_sha: option_env!("FOLIO_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: {err}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &mut out)
}

/// Execute the CLI with explicit arguments, writing command output to `out`.
///
/// Logging is left untouched so embedding callers keep their own subscriber.
/// Help and version text go to `out`; usage errors go to stderr and exit with `2`.
pub fn run_with<I, T>(args: I, out: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => execute(&cli, out),
        Err(err) => match report_usage(&err, out) {
            Ok(()) => err.exit_code(),
            Err(failure) => failure.exit_code(),
        },
    }
}

fn report_usage(err: &clap::Error, out: &mut dyn Write) -> CliResult<()> {
    let rendered = err.render();
    let written = if err.use_stderr() {
        write!(io::stderr(), "{rendered}")
    } else {
        write!(out, "{rendered}")
    };
    written.map_err(|io_err| CliError::write_failed(&io_err))
}

fn execute(cli: &Cli, out: &mut dyn Write) -> i32 {
    match dispatch(cli, out) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn dispatch(cli: &Cli, out: &mut dyn Write) -> CliResult<()> {
    match &cli.command {
        Command::Replay(args) => handle_replay(args, cli.output, out),
        Command::Plan(args) => handle_plan(args, cli.output, out),
    }
}

#[derive(Parser)]
#[command(name = "folio", about = "Replay recorded fetch scripts against Folio caches")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "FOLIO_LOG",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log filter used when RUST_LOG is unset"
    )]
    log_level: String,
    #[arg(
        long,
        global = true,
        value_parser = parse_log_format,
        default_value = "pretty",
        help = "Log output format: pretty or json"
    )]
    log_format: LogFormat,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply every event of a script and print the resulting cache snapshot.
    Replay(ReplayArgs),
    /// Replay a script, then list the fetch windows a viewport still needs.
    Plan(PlanArgs),
}

#[derive(Args)]
pub(crate) struct ReplayArgs {
    #[arg(value_name = "SCRIPT")]
    pub(crate) script: PathBuf,
    #[arg(long, value_name = "FILE", help = "Cache policy JSON file")]
    pub(crate) policy: Option<PathBuf>,
    #[arg(long, help = "Print the cache state after every event")]
    pub(crate) steps: bool,
}

#[derive(Args)]
pub(crate) struct PlanArgs {
    #[arg(value_name = "SCRIPT")]
    pub(crate) script: PathBuf,
    #[arg(long, value_name = "FILE", help = "Cache policy JSON file")]
    pub(crate) policy: Option<PathBuf>,
    #[arg(long, requires = "length", help = "First row of the viewport")]
    pub(crate) start: Option<usize>,
    #[arg(long, requires = "start", help = "Rows in the viewport")]
    pub(crate) length: Option<usize>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|err: TelemetryError| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn viewport_bounds_must_be_paired() {
        assert!(Cli::try_parse_from(["folio", "plan", "s.json", "--start", "2"]).is_err());
        let cli =
            Cli::try_parse_from(["folio", "plan", "s.json", "--start", "2", "--length", "3"])
                .unwrap();
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.start, Some(2));
                assert_eq!(args.length, Some(3));
            }
            Command::Replay(_) => panic!("expected plan command"),
        }
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "folio",
            "replay",
            "s.json",
            "--output",
            "json",
            "--log-format",
            "json",
            "--steps",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Replay(ref args) if args.steps));
    }

    #[test]
    fn log_format_is_parsed_by_telemetry() {
        let cli = Cli::try_parse_from(["folio", "plan", "s.json"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Pretty);

        let err = Cli::try_parse_from(["folio", "--log-format", "yaml", "plan", "s.json"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown log format 'yaml'"));
    }

    #[test]
    fn usage_errors_exit_with_two() {
        let mut out = Vec::new();
        assert_eq!(run_with(["folio", "rewind"], &mut out), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn help_is_written_to_the_command_output() {
        let mut out = Vec::new();
        assert_eq!(run_with(["folio", "--help"], &mut out), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("replay"));
        assert!(text.contains("plan"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn unwritable_help_is_an_operational_failure() {
        assert_eq!(run_with(["folio", "--help"], &mut ClosedPipe), 3);
    }
}
