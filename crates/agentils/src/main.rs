//! A simple program demonstrates how to use `agentils` as a library.
//!
//! Run it with a prompt to get one answer, or without arguments to chat.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::process::ExitCode;
use std::time::Duration;

use agentils::EnvSettings;
use agentils::core::{Agent, Error, Output, Result, Session};
use agentils::tools::{GlobTool, ReadFileTool};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let agent = match build_agent() {
        Ok(agent) => agent,
        Err(err) => {
            eprintln!("{}", err.bright_red());
            return ExitCode::FAILURE;
        }
    };

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        chat(agent.create_session()).await;
        return ExitCode::SUCCESS;
    }

    let prompt = args.join(" ");
    match with_spinner(agent.execute(|| prompt)).await {
        Ok(output) => {
            print_output(&output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn build_agent() -> Result<Agent> {
    let settings = EnvSettings::from_env()?;
    let root = env::current_dir().map_err(|err| {
        Error::Config(format!("cannot determine the working directory: {err}"))
    })?;

    let mut config = settings.generation_config()?;
    config.system_instruction = Some(system_instruction());

    settings
        .agent_builder()?
        .with_config(config)
        .with_tool(ReadFileTool::new(&root))
        .with_tool(GlobTool::new(root))
        .build()
}

async fn chat(mut session: Session) {
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("> ");
        if std::io::stdout().flush().is_err() {
            break;
        }

        let Some(line) = read_line(&mut lines).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match with_spinner(session.send_message(line)).await {
            Ok(output) => print_output(&output),
            Err(err) => print_error(&err),
        }
        debug!("history has {} turn(s)", session.history().len());
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    match lines.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

/// Shows a spinner until `fut` completes.
async fn with_spinner<F: Future>(fut: F) -> F::Output {
    let style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(style);
    progress_bar.set_message("🤔 Thinking...");
    progress_bar.enable_steady_tick(Duration::from_millis(100));

    let output = fut.await;
    // Finish the progress bar before printing anything else.
    progress_bar.finish_and_clear();
    output
}

fn print_output(output: &Output) {
    let text = format!("{output:#}");
    println!("{}🤖 {}", BAR_CHAR.bright_cyan(), text.bright_white());
}

fn print_error(err: &Error) {
    let bar = BAR_CHAR.bright_red();
    eprintln!("{bar}⚠️  {err}");
    if let Error::OutputParse { raw, .. } = err {
        eprintln!("{bar}{}", raw.bright_white());
    }
}

fn system_instruction() -> String {
    format!(
        "You are a helpful assistant running on {}. You can inspect the \
         user's workspace with the `glob` and `read_file` tools. Paths are \
         always relative to the workspace. Answer concisely.",
        host_os()
    )
}

#[inline]
fn host_os() -> &'static str {
    let os = std::env::consts::OS;
    match os {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        _ => "some other OS",
    }
}
