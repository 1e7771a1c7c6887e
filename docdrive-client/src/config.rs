//! Client configuration types and builders.

use std::time::Duration;

use docdrive_core::DriverError;

use crate::read_preference::{ReadMode, TagSet};

/// Default read preference mode.
const DEFAULT_READ_MODE: ReadMode = ReadMode::Primary;
/// Characters a database name may not contain.
const INVALID_DATABASE_CHARS: &[char] = &['/', '\\', '.', ' ', '"', '$', '\0'];
/// Maximum database name length in bytes.
const MAX_DATABASE_NAME_LEN: usize = 64;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the validation message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for DriverError {
    fn from(err: ConfigError) -> Self {
        DriverError::Configuration(err.message)
    }
}

/// Checks that `name` can be used as a database name.
pub(crate) fn validate_database_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::new("database name must not be empty"));
    }
    if name.len() > MAX_DATABASE_NAME_LEN {
        return Err(ConfigError::new(format!(
            "database name must not exceed {} bytes",
            MAX_DATABASE_NAME_LEN
        )));
    }
    if let Some(c) = name.chars().find(|c| INVALID_DATABASE_CHARS.contains(c)) {
        return Err(ConfigError::new(format!(
            "database name '{}' contains invalid character {:?}",
            name.escape_default(),
            c
        )));
    }
    Ok(())
}

/// Main client configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    database: Option<String>,
    read_mode: ReadMode,
    tag_sets: Vec<TagSet>,
    operation_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the default database, if configured.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Returns the read preference mode.
    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Returns the read preference tag sets, in priority order.
    pub fn tag_sets(&self) -> &[TagSet] {
        &self.tag_sets
    }

    /// Returns the per-operation timeout. `None` waits indefinitely.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    database: Option<String>,
    read_mode: Option<ReadMode>,
    tag_sets: Vec<TagSet>,
    operation_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Creates a new client configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default database.
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    /// Sets the read preference mode.
    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = Some(mode);
        self
    }

    /// Appends a tag set; tag sets are tried in the order they were added.
    pub fn add_tag_set(mut self, tag_set: TagSet) -> Self {
        self.tag_sets.push(tag_set);
        self
    }

    /// Replaces all tag sets.
    pub fn tag_sets(mut self, tag_sets: impl IntoIterator<Item = TagSet>) -> Self {
        self.tag_sets = tag_sets.into_iter().collect();
        self
    }

    /// Sets the per-operation timeout.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Builds the client configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the database name is empty, too long or contains a reserved character
    /// - tag sets are combined with the primary read mode
    /// - the operation timeout is zero
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if let Some(name) = &self.database {
            validate_database_name(name)?;
        }

        let read_mode = self.read_mode.unwrap_or(DEFAULT_READ_MODE);
        if read_mode == ReadMode::Primary && !self.tag_sets.is_empty() {
            return Err(ConfigError::new(
                "tag sets are not allowed with primary read preference",
            ));
        }

        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::new("operation_timeout must be greater than zero"));
        }

        Ok(ClientConfig {
            database: self.database,
            read_mode,
            tag_sets: self.tag_sets,
            operation_timeout: self.operation_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_config() {
        let config = ClientConfig::default();
        assert_eq!(config.database(), None);
        assert_eq!(config.read_mode(), ReadMode::Primary);
        assert!(config.tag_sets().is_empty());
        assert_eq!(config.operation_timeout(), None);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = ClientConfig::builder().build().unwrap();
        assert_eq!(config.read_mode(), ClientConfig::default().read_mode());
    }

    #[test]
    fn test_builder_full() {
        let config = ClientConfig::builder()
            .database("inventory")
            .read_mode(ReadMode::SecondaryPreferred)
            .add_tag_set(TagSet::new().with("dc", "east"))
            .add_tag_set(TagSet::new())
            .operation_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(config.database(), Some("inventory"));
        assert_eq!(config.read_mode(), ReadMode::SecondaryPreferred);
        assert_eq!(config.tag_sets().len(), 2);
        assert_eq!(config.operation_timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_builder_replaces_tag_sets() {
        let config = ClientConfig::builder()
            .read_mode(ReadMode::Nearest)
            .add_tag_set(TagSet::new().with("dc", "west"))
            .tag_sets(vec![TagSet::new().with("dc", "east")])
            .build()
            .unwrap();
        assert_eq!(config.tag_sets(), &[TagSet::new().with("dc", "east")]);
    }

    #[test]
    fn test_builder_empty_database_fails() {
        let result = ClientConfig::builder().database("").build();
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("database name must not be empty"));
    }

    #[test]
    fn test_builder_invalid_database_chars_fail() {
        for name in ["a.b", "a b", "a$b", "a/b", "a\0b"] {
            assert!(
                ClientConfig::builder().database(name).build().is_err(),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_builder_long_database_fails() {
        let name = "d".repeat(MAX_DATABASE_NAME_LEN + 1);
        assert!(ClientConfig::builder().database(name).build().is_err());
    }

    #[test]
    fn test_builder_primary_with_tags_fails() {
        let result = ClientConfig::builder()
            .add_tag_set(TagSet::new().with("dc", "east"))
            .build();
        assert!(result
            .unwrap_err()
            .message()
            .contains("not allowed with primary"));
    }

    #[test]
    fn test_builder_zero_timeout_fails() {
        let result = ClientConfig::builder()
            .operation_timeout(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::new("bad value");
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn test_config_error_converts_to_driver_error() {
        let err: DriverError = ConfigError::new("bad value").into();
        assert!(matches!(err, DriverError::Configuration(ref m) if m == "bad value"));
    }
}
