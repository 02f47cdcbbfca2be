//! Connection descriptor.

use crate::strategy::IdStrategy;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default bound on pooled relational connections.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Immutable bundle of connection parameters.
///
/// Built once per repository setup and consumed by a single adapter
/// `connect` call. Network backends read the host/credential fields, the
/// file backends read [`ConnectionDescriptor::path`]. Every backend reads
/// the identifier strategy.
///
/// # Example
///
/// ```
/// use polystore_storage::{ConnectionDescriptor, IdStrategy};
///
/// let descriptor = ConnectionDescriptor::builder()
///     .username("bank")
///     .password("secret")
///     .host("db.internal")
///     .database("truebank")
///     .build();
///
/// assert_eq!(descriptor.port(), 0);
/// assert_eq!(descriptor.strategy(), IdStrategy::Incremental);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    username: String,
    password: Option<String>,
    host: String,
    port: u16,
    database: String,
    path: Option<PathBuf>,
    strategy: IdStrategy,
    pool_size: usize,
    srv: bool,
}

impl ConnectionDescriptor {
    /// Starts a new builder.
    #[must_use]
    pub fn builder() -> ConnectionDescriptorBuilder {
        ConnectionDescriptorBuilder::default()
    }

    /// Username, empty when the backend takes no credentials.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Optional password.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port; 0 means the backend default.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Filesystem path for file-backed stores.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Identifier strategy.
    #[must_use]
    pub fn strategy(&self) -> IdStrategy {
        self.strategy
    }

    /// Upper bound on pooled connections.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Whether the document store is addressed through DNS seed records.
    #[must_use]
    pub fn srv(&self) -> bool {
        self.srv
    }
}

// Passwords stay out of logs.
impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("path", &self.path)
            .field("strategy", &self.strategy)
            .field("pool_size", &self.pool_size)
            .field("srv", &self.srv)
            .finish()
    }
}

/// Builder for [`ConnectionDescriptor`].
#[derive(Debug, Clone)]
pub struct ConnectionDescriptorBuilder {
    username: String,
    password: Option<String>,
    host: String,
    port: u16,
    database: String,
    path: Option<PathBuf>,
    strategy: IdStrategy,
    pool_size: usize,
    srv: bool,
}

impl Default for ConnectionDescriptorBuilder {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            host: String::new(),
            port: 0,
            database: String::new(),
            path: None,
            strategy: IdStrategy::default(),
            pool_size: DEFAULT_POOL_SIZE,
            srv: false,
        }
    }
}

impl ConnectionDescriptorBuilder {
    /// Sets the username.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets or clears the password.
    #[must_use]
    pub fn maybe_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Sets the host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port (0 keeps the backend default).
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the database name.
    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the filesystem path.
    #[must_use]
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the identifier strategy.
    #[must_use]
    pub const fn strategy(mut self, strategy: IdStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the connection pool bound. Values below 1 are raised to 1.
    #[must_use]
    pub fn pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Addresses the document store through DNS seed records.
    #[must_use]
    pub const fn srv(mut self, srv: bool) -> Self {
        self.srv = srv;
        self
    }

    /// Finishes the descriptor.
    #[must_use]
    pub fn build(self) -> ConnectionDescriptor {
        ConnectionDescriptor {
            username: self.username,
            password: self.password,
            host: self.host,
            port: self.port,
            database: self.database,
            path: self.path,
            strategy: self.strategy,
            pool_size: self.pool_size,
            srv: self.srv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let d = ConnectionDescriptor::builder().build();
        assert_eq!(d.port(), 0);
        assert_eq!(d.password(), None);
        assert_eq!(d.path(), None);
        assert_eq!(d.strategy(), IdStrategy::Incremental);
        assert_eq!(d.pool_size(), DEFAULT_POOL_SIZE);
        assert!(!d.srv());
    }

    #[test]
    fn builder_pattern() {
        let d = ConnectionDescriptor::builder()
            .username("u")
            .password("p")
            .host("h")
            .port(27017)
            .database("blog")
            .path("/tmp/store.yml")
            .strategy(IdStrategy::CallerUuid)
            .pool_size(0)
            .build();

        assert_eq!(d.username(), "u");
        assert_eq!(d.password(), Some("p"));
        assert_eq!(d.host(), "h");
        assert_eq!(d.port(), 27017);
        assert_eq!(d.database(), "blog");
        assert_eq!(d.path(), Some(Path::new("/tmp/store.yml")));
        assert_eq!(d.strategy(), IdStrategy::CallerUuid);
        assert_eq!(d.pool_size(), 1);
    }

    #[test]
    fn debug_hides_password() {
        let d = ConnectionDescriptor::builder().password("hunter2").build();
        let rendered = format!("{d:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("***"));
    }
}
