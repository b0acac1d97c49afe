//! HTTP API for document analysis.
//!
//! Provides:
//! - Login and token renewal
//! - CSV upload with validation
//! - Document analysis through the cognitive service
//! - Audit history with filtering and export
//! - Two small HTML pages driving the API

mod auth;
mod error;
mod handlers;
mod routes;
mod templates;

pub use auth::AuthUser;
pub use error::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::JwtService;
use crate::cognitive::{AzureAnalyzer, DocumentAnalyzer};
use crate::config::{Settings, StorageBackend};
use crate::repository::DieselDbContext;
use crate::services::{
    AuthService, DocumentService, EventService, FileService, TokenService,
};
use crate::storage::{LocalStore, ObjectStore, S3Store};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub app_name: Arc<str>,
    pub jwt: Arc<JwtService>,
    pub upload_role: Arc<str>,
    pub max_upload_bytes: usize,
    pub auth: AuthService,
    pub tokens: TokenService,
    pub files: FileService,
    pub documents: DocumentService,
    pub events: EventService,
}

impl AppState {
    /// Build state with the storage backend and analyzer named in `settings`.
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let store: Arc<dyn ObjectStore> = match settings.storage.backend {
            StorageBackend::S3 => Arc::new(S3Store::from_settings(&settings.storage.s3).await),
            StorageBackend::Local => Arc::new(LocalStore::new(&settings.storage.local_dir)),
        };
        let analyzer: Arc<dyn DocumentAnalyzer> =
            Arc::new(AzureAnalyzer::from_settings(&settings.azure)?);

        Self::from_parts(settings, settings.create_db_context(), store, analyzer)
    }

    /// Build state from explicit collaborators.
    pub fn from_parts(
        settings: &Settings,
        ctx: DieselDbContext,
        store: Arc<dyn ObjectStore>,
        analyzer: Arc<dyn DocumentAnalyzer>,
    ) -> anyhow::Result<Self> {
        let jwt = settings.jwt_service()?;
        let presign_ttl = Duration::from_secs(settings.storage.presign_secs);

        Ok(Self {
            app_name: Arc::from(settings.app_name.as_str()),
            upload_role: Arc::from(settings.auth.upload_role.as_str()),
            max_upload_bytes: settings.max_upload_bytes,
            auth: AuthService::new(ctx.users(), settings.password_hasher(), jwt.clone()),
            tokens: TokenService::new(jwt.clone(), settings.auth.renewal_minutes),
            files: FileService::new(ctx.files(), store.clone(), presign_ttl),
            documents: DocumentService::new(ctx.documents(), store, analyzer),
            events: EventService::new(ctx.events()),
            jwt: Arc::new(jwt),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings).await?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting {} at http://{}", settings.app_name, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
