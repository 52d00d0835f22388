use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use playlist_sync::config::DEFAULT_PORT;
use playlist_sync::trigger::{self, TriggerState};
use playlist_sync::{
    Config, GoogleSecretManager, PlaylistPair, SpotifyAuth, SpotifySyncJob, SyncJob,
};

#[derive(Parser)]
#[command(name = "playlist-sync")]
#[command(about = "Copy new tracks from one Spotify playlist into another")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP trigger that runs a synchronization per request
    Serve {
        /// Port to listen on (or set PORT env var)
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Run one synchronization and exit
    Sync,

    /// Authorize with Spotify once and store the token in Secret Manager
    Authorize,

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { port } => {
            let job = build_job()?;
            trigger::serve(TriggerState::new(Arc::new(job)), port)
                .await
                .context("HTTP trigger stopped")?;
        }
        Commands::Sync => {
            sync_once().await?;
        }
        Commands::Authorize => {
            authorize().await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

fn build_job() -> Result<SpotifySyncJob<GoogleSecretManager>> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let playlists = PlaylistPair::from_env().context("Failed to load playlist configuration")?;

    let auth = SpotifyAuth::new(&config, GoogleSecretManager::new(&config));
    Ok(SpotifySyncJob::new(auth, playlists))
}

async fn sync_once() -> Result<()> {
    println!("{}", "Spotify Playlist Sync".cyan().bold());
    println!("{}", "=".repeat(50));

    let job = build_job()?;
    let report = job.run().await.context("Synchronization failed")?;

    println!("Destination tracks: {}", report.destination_tracks);
    println!("Source tracks: {}", report.source_tracks);
    println!("New tracks copied: {}", report.new_tracks.to_string().green());
    println!("Requests sent: {}", report.chunks_sent);
    println!("\n{}", report.status().green());

    Ok(())
}

async fn authorize() -> Result<()> {
    println!("{}", "Spotify Authorization".cyan().bold());
    println!("{}", "=".repeat(50));

    let config = Config::from_env().context("Failed to load configuration")?;
    let auth = SpotifyAuth::new(&config, GoogleSecretManager::new(&config));

    auth.authorize_interactive()
        .await
        .context("Failed to authorize with Spotify")?;

    println!(
        "\n{}",
        format!("Token stored in {}", config.secret_name()).green()
    );
    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Spotify Playlist Sync Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");
    println!("   - Add 'http://127.0.0.1:8080/callback' as a redirect URI");

    println!("\n{}", "2. Secret Manager Setup".yellow());
    println!("   - Create a secret: gcloud secrets create <secret-id>");
    println!("   - Grant the runtime service account the Secret Manager");
    println!("     Secret Accessor and Secret Version Manager roles");

    println!("\n{}", "3. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REDIRECT_URI=http://127.0.0.1:8080/callback");
    println!("     GCP_PROJECT_ID=your_project_id");
    println!("     GCP_SECRET_ID=your_secret_id");
    println!("     SOURCE_PLAYLIST_ID=playlist_to_copy_from");
    println!("     DESTINATION_PLAYLIST_ID=playlist_to_copy_into");
    println!("   - Outside Google Cloud also set GCP_ACCESS_TOKEN, e.g.");
    println!("     from 'gcloud auth print-access-token'");

    println!("\n{}", "4. Usage".yellow());
    println!("   - playlist-sync authorize   (once, stores the token)");
    println!("   - playlist-sync sync        (one synchronization run)");
    println!("   - playlist-sync serve       (HTTP trigger on $PORT)");

    println!("\n{}", "Ready to sync!".green());
}
