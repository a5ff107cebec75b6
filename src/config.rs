use std::env;

/// Runtime configuration, loaded once at startup from the environment.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
}

const DEFAULT_JWT_SECRET: &str = "change_this_in_prod";

impl EnvConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        EnvConfig {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite::memory:".to_string()),
            jwt_secret,
        }
    }
}
