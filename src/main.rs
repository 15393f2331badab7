use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use inferbridge::app::{
    build_state, handle_fatal_error, init_logging, load_config, AppConfig, CliOverrides,
};
use inferbridge::error::{ErrorCode, GatewayError};
use inferbridge::server::{self, health::locate_binary, AppState};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Serve a local inference binary behind an OpenAI-compatible API
#[derive(Parser)]
#[command(name = "inferbridge", version)]
#[command(about = "OpenAI-compatible chat completions for a local LLM binary", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (replaces ./inferbridge.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default command)
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to bind
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one prompt through the inference pipeline and print the answer
    Ask {
        prompt: String,

        /// Backend to run on (cpu, gpu, npu, ...)
        #[arg(short, long)]
        backend: Option<String>,

        /// Print the answer in paced chunks as a streaming client would see it
        #[arg(long)]
        stream: bool,
    },
    /// Validate configuration and check that the binary and model exist
    Check {
        /// Also run a short prompt end to end
        #[arg(long)]
        self_test: bool,

        /// Deadline for the self-test in seconds
        #[arg(long, default_value = "30")]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(e) = run(cli).await {
        handle_fatal_error(e, verbose);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    });

    let overrides = match &command {
        Commands::Serve { host, port } => CliOverrides {
            host: host.clone(),
            port: *port,
            backend: None,
        },
        Commands::Ask { backend, .. } => CliOverrides {
            backend: backend.clone(),
            ..CliOverrides::default()
        },
        Commands::Check { .. } => CliOverrides::default(),
    };

    let app = AppConfig::new(cli.verbose).with_config_path(cli.config);
    let config = match load_config(&app, &overrides).await {
        Ok(config) => config,
        Err(e) => {
            init_logging(&app);
            return Err(e.into());
        }
    };
    init_logging(&app.with_log_level(config.server.log_level.clone()));

    let state = build_state(config);
    match command {
        Commands::Serve { .. } => server::serve(state).await?,
        Commands::Ask { prompt, stream, .. } => run_ask(state, &prompt, stream).await?,
        Commands::Check {
            self_test,
            timeout_secs,
        } => run_check(state, self_test, Duration::from_secs(timeout_secs)).await?,
    }
    Ok(())
}

async fn run_ask(state: AppState, prompt: &str, stream: bool) -> Result<()> {
    let result = state
        .client
        .complete(prompt, None)
        .await
        .map_err(GatewayError::from)?;

    if let Some(metrics) = &result.metrics {
        info!(
            prefill = ?metrics.prefill_tokens_per_sec,
            decode = ?metrics.decode_tokens_per_sec,
            peak_memory_mb = ?metrics.peak_memory_mb,
            "Inference metrics"
        );
    }

    let mut out = std::io::stdout();
    if stream {
        let mut chunks = Box::pin(state.synthesizer.stream(&result.answer));
        while let Some(chunk) = chunks.next().await {
            write!(out, "{chunk}")?;
            out.flush()?;
        }
        writeln!(out)?;
    } else {
        writeln!(out, "{}", result.answer)?;
    }
    Ok(())
}

async fn run_check(state: AppState, self_test: bool, timeout: Duration) -> Result<()> {
    let inference = state.client.config();

    let binary = locate_binary(&inference.binary_path).ok_or_else(|| {
        GatewayError::execution_with_code(
            ErrorCode::EXEC_COMMAND_NOT_FOUND,
            "inference binary not found",
            Some(inference.binary_path.display().to_string()),
        )
    })?;
    println!("binary:  {}", binary.display());

    if !inference.model_path.is_file() {
        return Err(GatewayError::config_with_code(
            ErrorCode::CONFIG_PATH_ERROR,
            "model file not found",
            Some(inference.model_path.clone()),
        )
        .into());
    }
    println!("model:   {} ({})", inference.model_path.display(), state.model_id());
    println!("backend: {}", inference.backend);

    if self_test {
        let report = state
            .client
            .self_test(timeout)
            .await
            .map_err(GatewayError::from)?;
        println!("self-test: ok in {} ms: {}", report.elapsed_ms, report.answer);
    }
    Ok(())
}
