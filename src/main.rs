// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use friedcamera::app::AppModel;
use friedcamera::constants::window;
use friedcamera::i18n;

mod cli;

#[derive(Parser)]
#[command(name = "friedcamera")]
#[command(about = "Live JPEG-style crunch of a webcam feed")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=friedcamera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(version = env!("GIT_VERSION"), "Starting FriedCamera");

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    // Settings for configuring the application window and iced runtime.
    let settings = cosmic::app::Settings::default()
        .size(cosmic::iced::Size::new(
            window::DEFAULT_WIDTH,
            window::DEFAULT_HEIGHT,
        ))
        .size_limits(
            cosmic::iced::Limits::NONE
                .min_width(window::MIN_WIDTH)
                .min_height(window::MIN_HEIGHT),
        );

    // Starts the application's event loop with `()` as the application's flags.
    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}
