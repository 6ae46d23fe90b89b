use thiserror::Error;

pub const DEFAULT_DATABASE_COUNT: usize = 16;
pub const DEFAULT_MAX_CONNECTIONS: usize = 10_000;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("database count must be at least 1")]
    NoDatabases,
    #[error("max connections must be at least 1")]
    NoConnections,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Number of independently selectable databases.
    pub database_count: usize,
    /// Maximum concurrent client connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_count: DEFAULT_DATABASE_COUNT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database_count(mut self, database_count: usize) -> Self {
        self.database_count = database_count;
        self
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_count == 0 {
            return Err(ConfigError::NoDatabases);
        }

        if self.max_connections == 0 {
            return Err(ConfigError::NoConnections);
        }

        Ok(())
    }
}
