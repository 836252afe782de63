//! CLI entry point for guidebook

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "guidebook")]
#[command(version)]
#[command(about = "A static site generator for module-based documentation guides", long_about = None)]
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
    /// Initialize a new guide site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new module
    New {
        /// Title of the new module
        title: String,

        /// Division to place the module in (general, bronze, silver, gold, plat, adv)
        #[arg(long, default_value = "general")]
        division: String,

        /// Module id (defaults to the slugified title)
        #[arg(long)]
        id: Option<String>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,

        /// Regenerate every page, ignoring the cache
        #[arg(short, long)]
        force: bool,
    },

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

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Clean the public folder and cache
    Clean,

    /// List site information
    List {
        /// Type of content to list (modules, divisions)
        #[arg(default_value = "modules")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "guidebook=debug,info"
    } else {
        "guidebook=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing guide site in {:?}", target_dir);
            guidebook::commands::init::init_site(&target_dir)?;
            println!("Initialized guide site in {:?}", target_dir);
        }

        Commands::New {
            title,
            division,
            id,
        } => {
            let guide = guidebook::Guide::new(&base_dir)?;
            tracing::info!("Creating new {} module: {}", division, title);
            guidebook::commands::new::create_module(&guide, &title, &division, id.as_deref())?;
        }

        Commands::Generate { watch, force } => {
            let guide = guidebook::Guide::new(&base_dir)?;
            tracing::info!("Generating static files...");

            guidebook::commands::generate::run_with_options(&guide, force)?;
            println!("Generated successfully!");

            if watch {
                tracing::info!("Watching for file changes...");
                guidebook::commands::generate::watch(&guide).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            open,
            r#static,
        } => {
            let guide = guidebook::Guide::new(&base_dir)?;

            tracing::info!("Generating static files...");
            guide.generate()?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            guidebook::server::start(&guide, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let guide = guidebook::Guide::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            guide.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let guide = guidebook::Guide::new(&base_dir)?;
            guidebook::commands::list::run(&guide, &r#type)?;
        }

        Commands::Version => {
            println!("guidebook version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
