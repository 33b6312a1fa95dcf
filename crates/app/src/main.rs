// CLI modules
mod cli;

use clap::{Parser, Subcommand};
use cli::{args::Args, op::Op, Cat, Copy, Empty, Exists, Get, Ls, Put, Rm, Stat, Url};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

command_enum! {
    (Ls, Ls),
    (Stat, Stat),
    (Exists, Exists),
    (Cat, Cat),
    (Get, Get),
    (Put, Put),
    (Rm, Rm),
    (Url, Url),
    (Copy, Copy),
    (Empty, Empty),
}

/// Log to stderr so command output on stdout stays machine readable.
fn init_logging(log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let log_level: tracing::Level = log_level.parse().unwrap_or(tracing::Level::INFO);
    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
    guard
}

/// First Ctrl-C cancels the running operation, a second one exits.
fn watch_interrupts(token: common::cancel::CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("interrupted, cancelling (press Ctrl-C again to abort)");
        token.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let guard = init_logging(&args.log_level);

    let ctx = match cli::op::OpContext::load(args.config) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            drop(guard);
            std::process::exit(1);
        }
    };
    watch_interrupts(ctx.cancel.clone());
    tracing::debug!(command = args.command.name(), "running");

    let code = match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    drop(guard);
    std::process::exit(code);
}
