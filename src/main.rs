//! LeanFocus - a lightweight focus timer
//!
//! Alternates work and break phases, loops ambient noise for each phase and
//! shows the countdown in the tray and a floating overlay. `leanfocus run`
//! starts the daemon; the other commands control it over a Unix socket.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use leanfocus::cli::{Cli, Commands, Display, IpcClient};
use leanfocus::config::ConfigStore;
use leanfocus::daemon::{self, DaemonOptions};
use leanfocus::i18n;
use leanfocus::sound::NoiseLibrary;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided, show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Run(args) => {
            let socket_path = match cli.socket {
                Some(path) => path,
                None => daemon::default_socket_path()?,
            };
            let options = DaemonOptions {
                socket_path,
                config_path: args.config.unwrap_or_else(ConfigStore::default_path),
                assets_dir: args.assets,
                terminal_overlay: args.overlay,
            };
            daemon::run(options).await?;
        }
        Commands::Sounds { assets } => {
            let library = NoiseLibrary::scan(&assets.join(daemon::SOUNDS_DIR), i18n::current());
            Display::show_sounds(&library);
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
        Commands::Status => {
            let client = IpcClient::for_socket(cli.socket)?;
            let response = client.status().await?;
            Display::show_status(&response);
        }
        Commands::Start => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.start().await?);
        }
        Commands::Pause => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.pause().await?);
        }
        Commands::Toggle => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.toggle().await?);
        }
        Commands::Reset => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.reset().await?);
        }
        Commands::Restart => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.restart().await?);
        }
        Commands::Noise { kind, key } => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.noise(kind.into(), &key).await?);
        }
        Commands::Volume { volume } => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.volume(volume).await?);
        }
        Commands::Overlay => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.overlay().await?);
        }
        Commands::Style { font_size, opacity } => {
            let client = IpcClient::for_socket(cli.socket)?;
            Display::show_result(&client.style(font_size, opacity).await?);
        }
        Commands::Quit => {
            let client = IpcClient::for_socket(cli.socket)?.without_retries();
            Display::show_result(&client.quit().await?);
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
