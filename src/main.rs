//! # yomu
//!
//! Headless client and offline bookshelf for Komga media servers: log in,
//! browse the catalog, download books onto the local shelf and read the
//! shelf back without connectivity. All real behaviour lives in the library
//! crates; this binary is flag parsing and printing.

use clap::{Parser, Subcommand};
use miette::miette;
use std::fmt::Display;
use std::io::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;
use yomu_api::Catalog;
use yomu_config::Config;
use yomu_models::Page;
use yomu_offline::{DownloadProgress, IdentityKey, OfflineStore};
use yomu_session::{Session, Transport};
use yomu_vault::{FileVault, VaultHandle};

#[derive(Debug, Parser)]
#[command(name = "yomu", version, about = "Offline bookshelf for Komga media servers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log into a server and persist the session on this device
    Login {
        /// Server base URL, e.g. https://komga.example.com
        server: String,
        /// Account email
        email: String,
        /// Account password
        #[arg(long, env = "YOMU_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
    },
    /// Invalidate the session and forget the stored tokens
    Logout,
    /// Show the currently authenticated user
    Whoami,
    /// List the libraries visible to the user
    Libraries,
    /// List recently added series
    Series {
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// List books; defaults to recently added across all libraries
    Books {
        /// Books of one library, in series reading order
        #[arg(long, group = "scope")]
        library: Option<String>,
        /// Books of one series, in reading order
        #[arg(long, group = "scope")]
        series: Option<String>,
        /// Books the user is partway through
        #[arg(long, group = "scope")]
        keep_reading: bool,
        /// Recently added books (the default)
        #[arg(long, group = "scope")]
        recent: bool,
        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: i32,
    },
    /// Download a book onto the offline shelf
    Download {
        /// Remote book id
        book_id: String,
    },
    /// Operate on the offline shelf
    #[command(subcommand)]
    Offline(OfflineCommand),
}

#[derive(Debug, Subcommand)]
enum OfflineCommand {
    /// List every downloaded book
    List,
    /// Remove a downloaded book from the shelf
    Delete {
        /// Remote book id
        book_id: String,
    },
}

/// Everything a command needs, wired once.
struct App {
    session: Session,
    catalog: Catalog,
    shelf: OfflineStore,
}

impl App {
    fn build(config: &Config) -> miette::Result<Self> {
        let vault: VaultHandle = Arc::new(FileVault::new(&config.vault_dir).map_err(report)?);
        let transport = Transport::with_timeout(vault, config.request_timeout()).map_err(report)?;
        let catalog = Catalog::new(transport.clone());
        let shelf = OfflineStore::new(&config.shelf_dir, Arc::new(catalog.clone())).map_err(report)?;
        let session = Session::new(transport).with_login_timeout(config.login_timeout());
        Ok(Self { session, catalog, shelf })
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(report)?;
    let app = App::build(&config)?;

    match cli.command {
        Command::Login { server, email, password } => {
            let user = app.session.login(&server, &email, &password).await.map_err(report)?;
            println!("logged in as {} ({})", user.email, user.roles.join(", "));
        },
        Command::Logout => {
            app.session.logout().await.map_err(report)?;
            println!("logged out");
        },
        Command::Whoami => match app.session.refresh_user().await.map_err(report)? {
            Some(user) => {
                println!("{} ({})", user.email, user.roles.join(", "));
                if !user.shared_all_libraries {
                    println!("libraries: {}", user.shared_libraries_ids.join(", "));
                }
            },
            None => println!("not logged in"),
        },
        Command::Libraries => {
            for library in app.catalog.libraries().await.map_err(report)? {
                println!("{}  {}", library.id, library.name);
            }
        },
        Command::Series { page } => {
            let listing = app.catalog.recently_added_series(page).await.map_err(report)?;
            for series in &listing.content {
                println!("{}  {} ({} books)", series.id, series.metadata.title, series.books_count);
            }
            print_page_footer(&listing);
        },
        Command::Books { library, series, keep_reading, recent: _, page } => {
            let listing = match (library, series, keep_reading) {
                (Some(library_id), _, _) => app.catalog.library_books(&library_id, page).await,
                (_, Some(series_id), _) => app.catalog.series_books(&series_id, page).await,
                (_, _, true) => app.catalog.keep_reading(page).await,
                _ => app.catalog.recently_added_books(page).await,
            }
            .map_err(report)?;
            for book in &listing.content {
                println!("{}  {} #{}  {}", book.id, book.series_title, book.metadata.number, book.metadata.title);
            }
            print_page_footer(&listing);
        },
        Command::Download { book_id } => {
            let book = app.catalog.book(&book_id).await.map_err(report)?;
            let progress = TerminalProgress::default();
            app.shelf.download(&book, &progress).await.map_err(report)?;
            progress.clear();
            let key = IdentityKey::derive(&book.metadata.title, &book.id);
            println!("downloaded {} -> {}", book.metadata.title, key.content_path(app.shelf.root()).display());
        },
        Command::Offline(OfflineCommand::List) => {
            for record in app.shelf.list().await.map_err(report)? {
                println!("{}  {}  {}", record.book.id, record.book.metadata.title, record.book.size);
            }
        },
        Command::Offline(OfflineCommand::Delete { book_id }) => {
            let listing = app.shelf.list().await.map_err(report)?;
            match listing.into_iter().find(|record| record.book.id == book_id) {
                Some(record) => {
                    app.shelf.delete(&record.book).await.map_err(report)?;
                    println!("deleted {}", record.book.metadata.title);
                },
                None => println!("not on the shelf: {book_id}"),
            }
        },
    }
    Ok(())
}

fn report(err: impl Display) -> miette::Report {
    miette!("{err}")
}

fn print_page_footer<T>(page: &Page<T>) {
    if page.total_pages > 1 {
        println!("page {}/{}", page.number + 1, page.total_pages);
    }
}

/// In-place percentage on stderr.
///
/// The terminal 100% tick is suppressed; the caller clears the line once the
/// download settles instead of rendering completion.
#[derive(Default)]
struct TerminalProgress {
    last_percent: AtomicU64,
}

impl TerminalProgress {
    fn clear(&self) {
        eprint!("\r        \r");
        let _ = std::io::stderr().flush();
    }
}

impl DownloadProgress for TerminalProgress {
    fn transferred(&self, bytes: u64, total: Option<u64>) {
        let Some(total) = total.filter(|total| *total > 0) else {
            return;
        };
        if bytes >= total {
            return;
        }
        let percent = bytes * 100 / total;
        if self.last_percent.swap(percent, Ordering::Relaxed) != percent {
            eprint!("\r{percent:>3}%");
            let _ = std::io::stderr().flush();
        }
    }
}
