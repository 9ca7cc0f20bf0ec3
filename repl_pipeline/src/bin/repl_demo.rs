// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A calculator REPL on top of the pipeline. Try:
//! - `(1 +` then `2) * 3` to see multi-line input end up as one history entry.
//! - `sleep 5000` then `Ctrl+C` to interrupt a pending evaluation.
//! - Typing ahead while `sleep 2000` runs, the typed line waits for the prompt.
//! - Pasting several lines at once.
//! - `.editor` to enter a multi-line buffer, `Ctrl+D` to evaluate it.

use async_stream::stream;
use clap::Parser;
use r3bl_repl_pipeline::{ArithmeticEvaluator, AsyncRepl, CrosstermTerminalMode,
                         NoopTerminalMode, OutputDevice, PinnedInputStream, ReplConfig,
                         TTYResult, TerminalModeControl, TracingConfig,
                         is_fully_interactive, try_initialize_logging_global};
use tokio::io::AsyncReadExt;

use crate::clap_config::CLIArgs;

const STDIN_READ_BUFFER_SIZE: usize = 1_024;

#[tokio::main(flavor = "current_thread")]
#[allow(clippy::needless_return)]
async fn main() -> miette::Result<()> {
    let cli_args = CLIArgs::parse();

    let enable_logging = cli_args.enable_logging;
    enable_logging.then(|| {
        try_initialize_logging_global(TracingConfig::new_file(cli_args.log_file.clone()))
            .ok();
        // % is Display, ? is Debug.
        tracing::debug!(message = "Start logging...", cli_args = ?cli_args);
    });

    let mut config = match &cli_args.config {
        Some(path) => ReplConfig::try_load(path)?,
        None => ReplConfig::try_load_default()?,
    };
    if cli_args.no_block_on_newline {
        config.block_on_newline_by_default = false;
    }
    if cli_args.no_interrupt {
        config.interrupt_enabled = false;
    }

    let terminal_mode: Box<dyn TerminalModeControl> = match is_fully_interactive() {
        TTYResult::IsInteractive => Box::new(CrosstermTerminalMode),
        TTYResult::IsNotInteractive => Box::new(NoopTerminalMode),
    };

    let mut repl = AsyncRepl::try_new(
        config,
        ArithmeticEvaluator,
        (),
        OutputDevice::new_stdout(),
        terminal_mode,
    )?;

    // Raw mode is off while an evaluation is pending, so Ctrl+C shows up as SIGINT.
    let interrupt_notifier = repl.scheduler.interrupt_notifier.clone();
    let exit_event_queue = repl.scheduler.exit_event_queue.clone();
    let sigint_task = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            let receiver_count = interrupt_notifier.notify();
            tracing::debug!(message = "SIGINT", receiver_count = receiver_count);
            if receiver_count == 0 {
                exit_event_queue.request_exit();
            }
        }
    });

    repl.start_input_pump(stdin_byte_stream());
    let result = repl.run().await;

    sigint_task.abort();
    drop(repl);

    enable_logging.then(|| {
        tracing::debug!(message = "Stop logging...");
    });

    // The blocking stdin read can't be cancelled, so don't wait for the runtime to
    // shut down.
    if let Err(report) = result {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
    std::process::exit(0);
}

fn stdin_byte_stream() -> PinnedInputStream<Vec<u8>> {
    let it = stream! {
        let mut stdin = tokio::io::stdin();
        let mut buffer = [0_u8; STDIN_READ_BUFFER_SIZE];
        loop {
            match stdin.read(&mut buffer).await {
                Ok(0) => break,
                Ok(count) => yield buffer[..count].to_vec(),
                Err(error) => {
                    tracing::error!(message = "Could not read stdin", error = %error);
                    break;
                }
            }
        }
    };
    Box::pin(it)
}

mod clap_config {
    use std::path::PathBuf;

    use clap::Parser;

    /// More info: <https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_2/index.html>
    #[derive(Debug, Parser)]
    #[command(bin_name = "repl_demo")]
    #[command(about = "Integer calculator REPL with interruptible async evaluation")]
    #[command(version)]
    #[command(next_line_help = true)]
    #[command(arg_required_else_help(false))]
    pub struct CLIArgs {
        #[arg(long, short = 'l', help = "Log app output to a file for debugging.")]
        pub enable_logging: bool,

        #[arg(
            long,
            help = "Log file to use with --enable-logging. Defaults to `repl_pipeline_log.txt`."
        )]
        pub log_file: Option<String>,

        #[arg(
            long,
            short = 'c',
            help = "JSON config file. Defaults to `<config dir>/r3bl-repl/config.json`."
        )]
        pub config: Option<PathBuf>,

        #[arg(
            long,
            help = "Forward input typed during an evaluation right away, instead of holding it until the prompt is back."
        )]
        pub no_block_on_newline: bool,

        #[arg(long, help = "Don't race pending evaluations against Ctrl+C.")]
        pub no_interrupt: bool,
    }
}
