use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use shiori_api::{auth, TraktClient};
use shiori_core::config::AppConfig;
use shiori_core::models::{MediaKind, MediaRef};
use shiori_runtime::{
    DbHandle, RatingsRepository, RemoveFromTrakt, RemoveMode, UserSession,
};

#[derive(Parser)]
#[command(name = "shiori", about = "Track movies and TV shows on Trakt from the terminal.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in to Trakt using the device flow.
    Login,
    /// Sign out and drop the local ratings mirror.
    Logout,
    /// Refresh the local ratings mirror from Trakt.
    Sync,
    /// List the locally mirrored ratings of a kind.
    Ratings {
        #[arg(value_parser = parse_kind)]
        kind: MediaKind,
    },
    /// Rate an item (1-10).
    Rate {
        #[arg(value_parser = parse_kind)]
        kind: MediaKind,
        trakt_id: i64,
        rating: u8,
    },
    /// Remove an item's rating.
    Unrate {
        #[arg(value_parser = parse_kind)]
        kind: MediaKind,
        trakt_id: i64,
    },
    /// Browse a movie discovery feed.
    Discover {
        #[arg(value_parser = ["trending", "popular", "anticipated"])]
        feed: String,
    },
    /// Un-hide items on Trakt.
    RemoveHidden {
        #[arg(value_parser = ["show", "movie"])]
        mode: String,
        #[arg(required = true)]
        trakt_ids: Vec<i64>,
    },
}

fn parse_kind(s: &str) -> Result<MediaKind, String> {
    MediaKind::from_db_str(s)
        .ok_or_else(|| format!("unknown kind: {s} (expected show, season, or episode)"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let db_path = AppConfig::ensure_db_path()?;
    let db = DbHandle::open(&db_path).ok_or("failed to open database")?;
    let session = UserSession::new(db.clone());

    match cli.command {
        Command::Login => {
            require_client(&config)?;
            let device = auth::device_code(&config.trakt.client_id).await?;
            println!(
                "Visit {} and enter the code: {}",
                device.verification_url, device.user_code
            );
            let _ = open::that(&device.verification_url);

            let token = auth::poll_token(
                &config.trakt.client_id,
                &config.trakt.client_secret,
                &device,
            )
            .await?;
            session.save(&token).await?;
            println!("Signed in.");
        }
        Command::Logout => {
            let client = TraktClient::new(config.trakt.client_id.clone(), None);
            let repository = RatingsRepository::new(Arc::new(client), db.clone());
            repository.clear().await?;
            session.clear().await?;
            println!("Signed out.");
        }
        Command::Sync => {
            let repository = authorized_repository(&config, &session, db.clone()).await?;
            repository.preload_ratings().await;
            for kind in MediaKind::ALL {
                let count = repository.load_ratings(*kind).await?.len();
                println!("{kind}: {count} ratings");
            }
        }
        Command::Ratings { kind } => {
            let repository = authorized_repository(&config, &session, db.clone()).await?;
            let mut ratings = repository.load_ratings(kind).await?;
            ratings.sort_by(|a, b| b.rated_at.cmp(&a.rated_at));
            for rating in ratings {
                println!(
                    "{:>10}  {:>2}/10  {}",
                    rating.trakt_id,
                    rating.rating,
                    rating.rated_at.format("%Y-%m-%d")
                );
            }
        }
        Command::Rate {
            kind,
            trakt_id,
            rating,
        } => {
            let repository = authorized_repository(&config, &session, db.clone()).await?;
            repository
                .add_rating(MediaRef::new(trakt_id, kind), rating)
                .await?;
            println!("Rated {kind} {trakt_id}: {rating}/10");
        }
        Command::Unrate { kind, trakt_id } => {
            let repository = authorized_repository(&config, &session, db.clone()).await?;
            repository.delete_rating(MediaRef::new(trakt_id, kind)).await?;
            println!("Removed rating for {kind} {trakt_id}");
        }
        Command::Discover { feed } => {
            require_client(&config)?;
            let client = TraktClient::new(config.trakt.client_id.clone(), None);
            let genres = config.discover.genres.join(",");
            let limit = config.discover.limit;

            match feed.as_str() {
                "trending" => {
                    for entry in client.fetch_trending_movies(&genres, limit).await? {
                        let watchers = entry.watchers.unwrap_or(0);
                        println!("{:>6} watching  {}", watchers, movie_line(&entry.movie));
                    }
                }
                "popular" => {
                    for movie in client.fetch_popular_movies(&genres, limit).await? {
                        println!("{}", movie_line(&movie));
                    }
                }
                _ => {
                    for entry in client.fetch_anticipated_movies(&genres, limit).await? {
                        let lists = entry.list_count.unwrap_or(0);
                        println!("{:>6} lists  {}", lists, movie_line(&entry.movie));
                    }
                }
            }
        }
        Command::RemoveHidden { mode, trakt_ids } => {
            require_client(&config)?;
            let token = session.check_authorization().await?;
            let client = TraktClient::new(config.trakt.client_id.clone(), Some(token));
            let case = RemoveFromTrakt::new(Arc::new(client), session);

            let mode = match mode.as_str() {
                "show" => RemoveMode::Show,
                _ => RemoveMode::Movie,
            };
            case.remove_hidden(&trakt_ids, mode).await?;
            println!("Removed {} hidden item(s).", trakt_ids.len());
        }
    }

    Ok(())
}

/// Build a ratings repository backed by the signed-in user's session.
async fn authorized_repository(
    config: &AppConfig,
    session: &UserSession,
    db: DbHandle,
) -> Result<RatingsRepository<TraktClient>, Box<dyn std::error::Error>> {
    require_client(config)?;
    let token = session.check_authorization().await?;
    let client = TraktClient::new(config.trakt.client_id.clone(), Some(token));
    Ok(RatingsRepository::new(Arc::new(client), db))
}

fn require_client(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.trakt.client_id.is_empty() {
        return Err(format!(
            "no Trakt client id configured; edit {}",
            AppConfig::config_path().display()
        )
        .into());
    }
    Ok(())
}

fn movie_line(movie: &shiori_api::types::Movie) -> String {
    match movie.year {
        Some(year) => format!("{} ({year})", movie.title),
        None => movie.title.clone(),
    }
}
