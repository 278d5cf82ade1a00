use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use voxmystic_core::{Settings, SettingsManager, Studio, VoiceLibrary};

mod commands;
mod formatter;
mod interactive_app;

use crate::formatter::Formatter;
use crate::interactive_app::InteractiveApp;

#[derive(Parser, Debug)]
#[command(name = "voxmystic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "VoxMystic - narrate text with preset and cloned voices")]
struct Args {
    /// Narrate this text once and exit instead of starting the studio
    #[arg(long)]
    text: Option<String>,

    /// Voice to narrate with (preset or saved clone name)
    #[arg(long)]
    voice: Option<String>,

    /// Where to write the one-shot narration; defaults to the output directory
    #[arg(long, value_name = "FILE", requires = "text")]
    out: Option<PathBuf>,

    /// Load settings from a specific file
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Use a configured provider other than the active one
    #[arg(long, value_name = "NAME")]
    provider: Option<String>,

    /// Use a voice library file other than the configured one
    #[arg(long, value_name = "FILE")]
    voices: Option<PathBuf>,
}

fn main() -> Result<()> {
    setup_tracing()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let local = tokio::task::LocalSet::new();
        local.run_until(async_main()).await
    })
}

async fn async_main() -> Result<()> {
    let args = Args::parse();

    info!(
        "CLI startup: one_shot={}, voice={:?}, provider={:?}, settings={:?}",
        args.text.is_some(),
        args.voice,
        args.provider,
        args.settings
    );

    let (studio, settings) = open_studio(&args)?;

    match args.text.clone() {
        Some(text) => narrate_once(studio, &settings, &text, args.out).await,
        None => InteractiveApp::new(studio, settings).run().await,
    }
}

fn open_studio(args: &Args) -> Result<(Studio, Settings)> {
    let manager = match &args.settings {
        Some(path) => SettingsManager::from_path(path.clone())?,
        None => SettingsManager::new()?,
    };

    let mut settings = manager.settings().clone();
    if let Some(provider) = &args.provider {
        settings
            .set_active_provider(provider)
            .map_err(anyhow::Error::msg)?;
    }
    if let Some(voices) = &args.voices {
        settings.voices_path = Some(voices.clone());
    }

    let provider = settings
        .build_provider()
        .with_context(|| format!("Check the provider configuration in {:?}", manager.path()))?;
    let library = VoiceLibrary::load(settings.voices_path()?)?;
    info!(
        provider = provider.name(),
        clones = library.len(),
        library = ?library.path(),
        "studio ready"
    );

    let mut studio = Studio::new(provider, library);
    if let Err(e) = studio.select_voice(&settings.default_voice) {
        warn!("Default voice unavailable, keeping {}: {e}", studio.selected_voice().name());
        studio.dismiss_error();
    }
    if let Some(voice) = &args.voice {
        studio.select_voice(voice)?;
    }

    Ok((studio, settings))
}

async fn narrate_once(
    mut studio: Studio,
    settings: &Settings,
    text: &str,
    out: Option<PathBuf>,
) -> Result<()> {
    let formatter = Formatter::new();
    let spinner = formatter.spinner(&format!(
        "{} is narrating...",
        studio.selected_voice().name()
    ));
    let result = studio.narrate(text).await;
    spinner.finish_and_clear();

    let Some(record) = result? else {
        anyhow::bail!("Nothing to narrate");
    };

    let path = match out {
        Some(path) => {
            record.audio.write_to_path(&path)?;
            path
        }
        None => {
            let id = record.id.clone();
            studio.export(Some(&id), &settings.output_dir())?
        }
    };

    println!("{}", path.display());
    Ok(())
}

fn setup_tracing() -> Result<()> {
    use std::fs;
    use tracing_subscriber::fmt;

    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    let trace_dir = home.join(".voxmystic").join("trace");
    fs::create_dir_all(&trace_dir)?;

    let log_file = trace_dir.join("voxmystic.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Tracing initialized to {:?}", log_file);
    Ok(())
}
