//! Wiring shared by the command handlers

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::{HttpResourceApi, ResourceApi, Session};
use crate::config::{Config, SqliteCredentialStore};
use crate::schema::{EntitySchema, schema_keys};
use crate::table::ResourceTable;

pub struct AppContext {
    pub config: Config,
    pub credentials: Arc<SqliteCredentialStore>,
    pub session: Session,
    pub http: reqwest::Client,
    pub api: Arc<dyn ResourceApi>,
}

impl AppContext {
    pub async fn init(backend_url: Option<String>) -> Result<Self> {
        let config = load_config(backend_url)?;

        let db_path = config.database_path()?;
        let credentials = Arc::new(SqliteCredentialStore::open(&db_path).await?);
        let session = Session::new(credentials.clone());

        let http = reqwest::Client::builder()
            .user_agent(concat!("hajj-admin-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let api: Arc<dyn ResourceApi> =
            Arc::new(HttpResourceApi::with_client(http.clone(), config.backend_url()));

        log::debug!("Backend {} (admin {})", config.backend_url(), config.admin_url());
        Ok(Self {
            config,
            credentials,
            session,
            http,
            api,
        })
    }

    /// Unmounted table for the named entity
    pub fn table(&self, entity: &str) -> Result<ResourceTable> {
        let schema = resolve_schema(&self.config, entity)?;
        Ok(ResourceTable::new(schema, self.api.clone(), self.session.clone()))
    }
}

/// Config from disk and environment, with the `--backend-url` flag on top
pub fn load_config(backend_url: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = backend_url {
        config.backend_url = url;
    }
    Ok(config)
}

pub fn resolve_schema(config: &Config, entity: &str) -> Result<EntitySchema> {
    config.schema(entity).with_context(|| {
        format!(
            "Unknown entity '{}'. Known entities: {}",
            entity,
            schema_keys().join(", ")
        )
    })
}
