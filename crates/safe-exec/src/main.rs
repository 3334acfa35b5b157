//! Command-line wrapper: run one program with live stdio and signal relay.
//!
//! Logs go to stderr so the wrapped program owns stdout. The wrapper exits
//! with the child's exit code, `128 + signal` if the child was killed, and 1
//! for any other failure.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use safe_exec::{run_shell_command, ExecError, ExecOptions};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Parser)]
#[command(name = "safe-exec")]
#[command(about = "Run a program, forwarding SIGINT/SIGTERM to it")]
#[command(version = safe_exec::VERSION)]
struct Cmd {
    /// Directory to run the program in
    #[arg(short = 'C', long = "working-dir", value_name = "DIR")]
    working_dir: Option<PathBuf>,

    /// One argument of the primary invocation (repeatable). When the program's
    /// arguments differ from these, its stdout goes to stderr. Defaults to the
    /// program's own arguments.
    #[arg(long = "primary-arg", value_name = "ARG", allow_hyphen_values = true)]
    primary_args: Option<Vec<String>>,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log relay and process details
    #[arg(short, long)]
    verbose: bool,

    /// Program to run, followed by its arguments
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM [ARGS]..."
    )]
    command: Vec<String>,
}

impl Cmd {
    fn level(&self) -> Level {
        if self.quiet {
            Level::WARN
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }

    fn options(&self) -> ExecOptions {
        let primary = self.primary_args.as_deref().unwrap_or(self.args());
        let options = ExecOptions::new().with_primary_args(primary.iter().cloned());
        match &self.working_dir {
            Some(dir) => options.with_working_dir(dir),
            None => options,
        }
    }
}

fn main() -> ExitCode {
    let cmd = Cmd::parse();
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(cmd.level())
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match run(&cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(cmd: &Cmd) -> Result<()> {
    run_shell_command(&cmd.options(), cmd.program(), cmd.args())
        .with_context(|| format!("running {}", cmd.program()))
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    let Some(exec) = err.downcast_ref::<ExecError>() else {
        return 1;
    };
    if let Some(code) = exec.exit_code() {
        return u8::try_from(code).unwrap_or(1).max(1);
    }
    match exec.terminating_signal() {
        Some(sig) => u8::try_from(128 + sig).unwrap_or(1),
        None => 1,
    }
}
