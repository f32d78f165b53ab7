use std::sync::Arc;

use db::DBService;
use services::services::{
    booking::BookingService,
    config::{Config, ConfigError},
    identity::IdentityVerifier,
};

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shared state handed to every route.
#[derive(Clone)]
pub struct LocalDeployment {
    db: DBService,
    config: Arc<Config>,
    booking: BookingService,
    identity: IdentityVerifier,
}

impl LocalDeployment {
    pub async fn new(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(config.database_url.as_deref()).await?;
        Self::from_parts(db, config)
    }

    pub fn from_parts(db: DBService, config: Config) -> Result<Self, DeploymentError> {
        let identity = IdentityVerifier::new(config.jwt_secret()?, config.auth.token_ttl_minutes);
        let booking = BookingService::new(
            db.pool.clone(),
            config.business_hours.clone(),
            config.scoping_enabled(),
        );

        Ok(Self {
            db,
            config: Arc::new(config),
            booking,
            identity,
        })
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn booking(&self) -> &BookingService {
        &self.booking
    }

    pub fn identity(&self) -> &IdentityVerifier {
        &self.identity
    }
}
