//! Repository configuration.

use crate::error::{CoreError, CoreResult};
use crate::factory::BackendKind;
use polystore_storage::{ConnectionDescriptor, IdStrategy};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

/// Settings for opening a repository.
///
/// Read from YAML (or any other serde format), or from flat key/value
/// pairs with [`RepositoryConfig::from_settings`].
///
/// ```yaml
/// type: YAML
/// path: data/cards.yml
/// entity_style: INCREMENTAL
/// ```
///
/// `type` picks the backend. The network fields are used by the document
/// store; `path` is used by the file and relational backends, the latter
/// falling back to `database` when no path is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Backend kind, parsed with [`BackendKind::from_str`](std::str::FromStr).
    #[serde(rename = "type")]
    pub backend: Option<String>,
    /// Username.
    pub username: String,
    /// Password.
    pub password: Option<String>,
    /// Host name.
    pub host: String,
    /// Port; 0 keeps the backend default.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Filesystem path.
    pub path: Option<PathBuf>,
    /// Identifier strategy name (`INCREMENTAL`, `CUSTOM`, `UUID`).
    #[serde(alias = "entityStyle")]
    pub entity_style: Option<String>,
    /// Relational connection pool bound.
    #[serde(alias = "poolSize")]
    pub pool_size: Option<usize>,
    /// Address the document store through DNS seed records.
    pub srv: bool,
}

impl RepositoryConfig {
    /// Creates a configuration for `backend` with every other field empty.
    #[must_use]
    pub fn new(backend: BackendKind) -> Self {
        Self {
            backend: Some(backend.name().to_string()),
            ..Self::default()
        }
    }

    /// Builds a configuration from flat key/value settings.
    ///
    /// Keys are matched case-insensitively; `entityStyle` and
    /// `entity_style` are the same key. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] when a numeric or boolean
    /// setting does not parse.
    pub fn from_settings<I, K, V>(settings: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in settings {
            let key = key.as_ref();
            let value = value.into();
            match key.to_ascii_lowercase().replace('_', "").as_str() {
                "type" => config.backend = Some(value),
                "username" => config.username = value,
                "password" => config.password = Some(value),
                "host" => config.host = value,
                "port" => config.port = parse_setting(key, &value)?,
                "database" => config.database = value,
                "path" => config.path = Some(PathBuf::from(value)),
                "entitystyle" => config.entity_style = Some(value),
                "poolsize" => config.pool_size = Some(parse_setting(key, &value)?),
                "srv" => config.srv = parse_setting(key, &value)?,
                _ => debug!(key, "ignoring unknown repository setting"),
            }
        }
        Ok(config)
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the text is not a valid
    /// configuration.
    pub fn from_yaml_str(text: &str) -> CoreResult<Self> {
        serde_yaml::from_str(text)
            .map_err(|e| CoreError::invalid_config(format!("cannot parse settings: {e}")))
    }

    /// Resolves the backend kind and connection descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] when `type` is missing or
    /// unknown, the identifier strategy is unknown, or a relational backend
    /// is given a host.
    pub fn into_parts(self) -> CoreResult<(BackendKind, ConnectionDescriptor)> {
        let kind: BackendKind = self
            .backend
            .as_deref()
            .ok_or_else(|| CoreError::invalid_config("missing backend type"))?
            .parse()?;
        if kind == BackendKind::Relational && !self.host.is_empty() {
            return Err(CoreError::invalid_config(format!(
                "relational backend is embedded SQLite and cannot reach host {}",
                self.host
            )));
        }

        let strategy = match self.entity_style.as_deref() {
            Some(style) => style
                .parse::<IdStrategy>()
                .map_err(|e| CoreError::invalid_config(e.to_string()))?,
            None => IdStrategy::default(),
        };

        let mut builder = ConnectionDescriptor::builder()
            .username(self.username)
            .maybe_password(self.password)
            .host(self.host)
            .port(self.port)
            .database(self.database)
            .strategy(strategy)
            .srv(self.srv);
        if let Some(path) = self.path {
            builder = builder.path(path);
        }
        if let Some(pool_size) = self.pool_size {
            builder = builder.pool_size(pool_size);
        }
        Ok((kind, builder.build()))
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, value: &str) -> CoreResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CoreError::invalid_config(format!("invalid value for {key}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn from_settings_file_backend() {
        let config = RepositoryConfig::from_settings([
            ("type", "YAML"),
            ("path", "data/cards.yml"),
            ("entityStyle", "UUID"),
        ])
        .unwrap();

        let (kind, descriptor) = config.into_parts().unwrap();
        assert_eq!(kind, BackendKind::File);
        assert_eq!(descriptor.path(), Some(Path::new("data/cards.yml")));
        assert_eq!(descriptor.strategy(), IdStrategy::CallerUuid);
    }

    #[test]
    fn from_settings_network_backend() {
        let config = RepositoryConfig::from_settings([
            ("type", "mongodb"),
            ("username", "bank"),
            ("password", "secret"),
            ("host", "cluster0.example.net"),
            ("port", "27017"),
            ("database", "truebank"),
            ("srv", "true"),
        ])
        .unwrap();

        let (kind, descriptor) = config.into_parts().unwrap();
        assert_eq!(kind, BackendKind::DocumentStore);
        assert_eq!(descriptor.username(), "bank");
        assert_eq!(descriptor.password(), Some("secret"));
        assert_eq!(descriptor.port(), 27017);
        assert_eq!(descriptor.database(), "truebank");
        assert!(descriptor.srv());
        assert_eq!(descriptor.strategy(), IdStrategy::Incremental);
    }

    #[test]
    fn bad_number_is_invalid_config() {
        let err = RepositoryConfig::from_settings([("port", "lots")]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn missing_type_is_invalid_config() {
        let err = RepositoryConfig::default().into_parts().unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig { .. }));
    }

    #[test]
    fn unknown_style_is_invalid_config() {
        let mut config = RepositoryConfig::new(BackendKind::File);
        config.entity_style = Some("SEQUENTIAL".into());
        assert!(matches!(
            config.into_parts(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn networked_relational_settings_are_invalid_config() {
        let mysql = RepositoryConfig::from_settings([
            ("type", "MYSQL"),
            ("host", "db.internal"),
            ("port", "3306"),
            ("username", "bank"),
            ("password", "secret"),
            ("database", "truebank"),
        ])
        .unwrap();
        assert!(matches!(
            mysql.into_parts(),
            Err(CoreError::InvalidConfig { .. })
        ));

        let hosted = RepositoryConfig::from_settings([
            ("type", "SQLITE"),
            ("host", "db.internal"),
            ("database", "truebank"),
        ])
        .unwrap();
        assert!(matches!(
            hosted.into_parts(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn yaml_settings() {
        let config = RepositoryConfig::from_yaml_str(
            "type: SQLITE\ndatabase: bank.db\npool_size: 4\nentity_style: CUSTOM\n",
        )
        .unwrap();
        let (kind, descriptor) = config.into_parts().unwrap();
        assert_eq!(kind, BackendKind::Relational);
        assert_eq!(descriptor.database(), "bank.db");
        assert_eq!(descriptor.pool_size(), 4);
        assert_eq!(descriptor.strategy(), IdStrategy::CallerKey);
    }

    #[test]
    fn yaml_accepts_camel_case_style() {
        let config = RepositoryConfig::from_yaml_str("type: YAML\nentityStyle: UUID\n").unwrap();
        assert_eq!(config.entity_style.as_deref(), Some("UUID"));
    }
}
