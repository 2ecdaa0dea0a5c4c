//! CLI entry point for voyager-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "voyager-rs")]
#[command(version)]
#[command(about = "A fast static blog generator for headless CMS content", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Fetch posts and generate static files
    #[command(alias = "g")]
    Generate,

    /// Start a local server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder
    Clean,

    /// List posts known to the content source
    List,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "voyager_rs=debug,info"
    } else {
        "voyager_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = cli.cwd.unwrap_or_else(|| std::env::current_dir().unwrap());

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            voyager_rs::commands::init::init_site(&target_dir)?;
            println!("Initialized empty Voyager site in {:?}", target_dir);
        }

        Commands::Generate => {
            let app = voyager_rs::Voyager::new(&base_dir)?;
            tracing::info!("Generating static files...");
            app.generate().await?;
            println!("Generated successfully!");
        }

        Commands::Server { port, ip, open } => {
            let app = voyager_rs::Voyager::new(&base_dir)?;

            // Generate first
            tracing::info!("Generating static files...");
            app.generate().await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            voyager_rs::server::start(&app, &ip, port, open).await?;
        }

        Commands::Clean => {
            let app = voyager_rs::Voyager::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            app.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List => {
            let app = voyager_rs::Voyager::new(&base_dir)?;
            voyager_rs::commands::list::run(&app).await?;
        }

        Commands::Version => {
            println!("voyager-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
