//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig};
use crate::core::config::AppConfig;
use crate::core::constants::ENV_LOG;
use crate::core::shutdown::ShutdownService;
use crate::data::logs::{LogService, LogSettings};
use crate::data::{IssueRepository, MongoIssueStore};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub issues: Arc<dyn IssueRepository>,
    pub logs: Arc<LogService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let cli_config = cli::parse();
        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;

        let store = MongoIssueStore::connect(&config.database)
            .await
            .context("Failed to initialize MongoDB client")?;
        // An unreachable server must not stop startup; readiness reports it
        if let Err(e) = store.ensure_indexes().await {
            tracing::warn!(error = %e, "Could not ensure issue indexes");
        }
        let issues: Arc<dyn IssueRepository> = Arc::new(store);

        let logs = Arc::new(LogService::new(LogSettings::from(&config.logs)));
        let shutdown = ShutdownService::new(logs.clone());

        Ok(Self {
            shutdown,
            config,
            issues,
            logs,
        })
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", env!("CARGO_CRATE_NAME"));

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(&app.config);

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
