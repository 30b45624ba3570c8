//! CLI commands

use anyhow::{Context, Result, bail};
use catalog_core::{CatalogConfig, Direction, PageRequest, SortOrder};
use catalog_http::client::albums::{AlbumQuery, CoverFile};
use catalog_http::client::artists::ArtistQuery;
use catalog_http::notifications::NotificationSubscriber;
use catalog_http::types::{AlbumRequest, ArtistRequest, LoginRequest, RegisterRequest};
use catalog_http::{AlbumStore, ArtistStore, CatalogClient, SessionState};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the issued credentials
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "CATALOG_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget stored credentials
    Logout,

    /// Show whether credentials are stored
    Status,

    /// Artist operations
    Artists {
        #[command(subcommand)]
        command: ArtistCommands,
    },

    /// Album operations
    Albums {
        #[command(subcommand)]
        command: AlbumCommands,
    },

    /// Regional office operations
    Regionals {
        #[command(subcommand)]
        command: RegionalCommands,
    },

    /// Print album notifications as they arrive
    Watch,
}

/// Paging flags shared by listings
#[derive(Args)]
pub struct PageArgs {
    /// Zero-based page number
    #[arg(long, default_value = "0")]
    page: u32,

    /// Page size
    #[arg(long, default_value = "10")]
    size: u32,

    /// Sort descending
    #[arg(long)]
    desc: bool,
}

impl PageArgs {
    fn to_request(&self, field: &str) -> PageRequest {
        let direction = if self.desc {
            Direction::Desc
        } else {
            Direction::Asc
        };
        PageRequest {
            page: self.page,
            size: self.size,
            sort: SortOrder {
                field: field.to_string(),
                direction,
            },
        }
    }
}

#[derive(Subcommand)]
pub enum ArtistCommands {
    /// List artists
    List {
        /// Filter by name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one artist
    Get { id: i64 },
    /// Create an artist
    Create { name: String },
    /// Rename an artist
    Update { id: i64, name: String },
    /// Delete an artist
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum AlbumCommands {
    /// List albums
    List {
        /// Filter by artist name
        #[arg(long)]
        artist: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one album
    Get { id: i64 },
    /// Create an album
    Create {
        title: String,
        #[arg(long)]
        artist_id: i64,
    },
    /// Update an album
    Update {
        id: i64,
        title: String,
        #[arg(long)]
        artist_id: i64,
    },
    /// Delete an album
    Delete { id: i64 },
    /// Upload a cover image
    UploadCover { id: i64, file: PathBuf },
    /// Print the temporary cover URL
    CoverUrl { id: i64 },
}

#[derive(Subcommand)]
pub enum RegionalCommands {
    /// List regional offices
    List {
        /// Only active offices
        #[arg(long)]
        active: bool,
    },
    /// Synchronize with the third-party regional source
    Sync,
}

impl Commands {
    /// Commands that run until interrupted
    pub fn is_long_running(&self) -> bool {
        matches!(self, Self::Watch)
    }

    pub async fn execute(self, config: &CatalogConfig) -> Result<()> {
        let client = config::build_client(config)?;
        client.session().on_login_required(|event| {
            eprintln!(
                "Session ended ({}). Log in again with `catalog login` (route {}).",
                event.reason, event.login_route
            );
        });

        match self {
            Self::Login { username, password } => {
                client
                    .login(&LoginRequest {
                        username: username.clone(),
                        password,
                    })
                    .await
                    .context("Login failed")?;
                println!("Logged in as {username}");
            }
            Self::Register { username, password } => {
                client
                    .register(&RegisterRequest {
                        username: username.clone(),
                        password,
                    })
                    .await
                    .context("Registration failed")?;
                println!("Registered and logged in as {username}");
            }
            Self::Logout => {
                client.logout()?;
                println!("Logged out");
            }
            Self::Status => match client.session().current() {
                SessionState::Authenticated => println!("Logged in ({})", client.base_url()),
                _ => println!("Not logged in ({})", client.base_url()),
            },
            Self::Artists { command } => command.execute(&client).await?,
            Self::Albums { command } => command.execute(&client).await?,
            Self::Regionals { command } => command.execute(&client).await?,
            Self::Watch => watch(&client, config).await?,
        }
        Ok(())
    }
}

impl ArtistCommands {
    async fn execute(self, client: &CatalogClient) -> Result<()> {
        match self {
            Self::List { name, page } => {
                let store = ArtistStore::new();
                let query = ArtistQuery {
                    page: page.to_request("name"),
                    name,
                };
                store.load(client, &query).await?;
                let snapshot = store.snapshot();
                for artist in &snapshot.items {
                    println!("{:>6}  {}  ({} albums)", artist.id, artist.name, artist.albums_count);
                }
                println!(
                    "page {} of {}",
                    snapshot.current_page + 1,
                    snapshot.total_pages.max(1)
                );
            }
            Self::Get { id } => print_json(&client.get_artist(id).await?)?,
            Self::Create { name } => {
                print_json(&client.create_artist(&ArtistRequest { name }).await?)?;
            }
            Self::Update { id, name } => {
                print_json(&client.update_artist(id, &ArtistRequest { name }).await?)?;
            }
            Self::Delete { id } => {
                client.delete_artist(id).await?;
                println!("Deleted artist {id}");
            }
        }
        Ok(())
    }
}

impl AlbumCommands {
    async fn execute(self, client: &CatalogClient) -> Result<()> {
        match self {
            Self::List { artist, page } => {
                let store = AlbumStore::new();
                let query = AlbumQuery {
                    page: page.to_request("title"),
                    artist_name: artist,
                };
                store.load(client, &query).await?;
                let snapshot = store.snapshot();
                for album in &snapshot.items {
                    println!("{:>6}  {}  - {}", album.id, album.title, album.artist.name);
                }
                println!(
                    "page {} of {}",
                    snapshot.current_page + 1,
                    snapshot.total_pages.max(1)
                );
            }
            Self::Get { id } => print_json(&client.get_album(id).await?)?,
            Self::Create { title, artist_id } => {
                let album = AlbumRequest { title, artist_id };
                print_json(&client.create_album(&album).await?)?;
            }
            Self::Update {
                id,
                title,
                artist_id,
            } => {
                let album = AlbumRequest { title, artist_id };
                print_json(&client.update_album(id, &album).await?)?;
            }
            Self::Delete { id } => {
                client.delete_album(id).await?;
                println!("Deleted album {id}");
            }
            Self::UploadCover { id, file } => {
                let cover = CoverFile::from_path(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                client.upload_cover(id, cover).await?;
                println!("Uploaded cover for album {id}");
            }
            Self::CoverUrl { id } => println!("{}", client.cover_url(id).await?.url),
        }
        Ok(())
    }
}

impl RegionalCommands {
    async fn execute(self, client: &CatalogClient) -> Result<()> {
        match self {
            Self::List { active } => {
                let regionals = if active {
                    client.list_active_regionals().await?
                } else {
                    client.list_regionals().await?
                };
                for regional in regionals {
                    let state = if regional.active { "active" } else { "inactive" };
                    println!("{:>6}  {}  [{state}]", regional.id, regional.name);
                }
            }
            Self::Sync => {
                let result = client.synchronize_regionals().await?;
                println!(
                    "{} (inserted {}, updated {}, deactivated {})",
                    result.message, result.inserted, result.updated, result.deactivated
                );
            }
        }
        Ok(())
    }
}

async fn watch(client: &CatalogClient, config: &CatalogConfig) -> Result<()> {
    let token = client.credentials().access_token()?;
    if token.is_none() {
        bail!("Not logged in; run `catalog login` first");
    }

    let mut notifications = NotificationSubscriber::new(config.notifications.clone())
        .with_token(token)
        .spawn();
    info!(topic = %config.notifications.topic, "Watching album notifications");

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    break;
                };
                println!("{}", notification.message);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
