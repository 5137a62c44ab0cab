/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 18/10/26
******************************************************************************/

//! Service configuration.
//!
//! This module provides configuration options for the command and heartbeat
//! services. Durations serialize as whole milliseconds.

use ironbus_core::error::ServiceError;
use ironbus_core::types::DomainId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default time a persistent command waits for a response before a resend.
pub const DEFAULT_RESEND_THRESHOLD: Duration = Duration::from_secs(10);

/// Default period of the retry loop.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Configuration for a command service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandServiceConfig {
    /// Time since the last send after which a pending command is resent.
    #[serde(with = "duration_ms")]
    pub resend_threshold: Duration,
    /// Period of the retry loop.
    #[serde(with = "duration_ms")]
    pub retry_interval: Duration,
}

impl CommandServiceConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resend_threshold: DEFAULT_RESEND_THRESHOLD,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// Sets the resend threshold.
    #[must_use]
    pub const fn with_resend_threshold(mut self, threshold: Duration) -> Self {
        self.resend_threshold = threshold;
        self
    }

    /// Sets the retry loop period.
    #[must_use]
    pub const fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` if the retry interval is zero.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.retry_interval.is_zero() {
            return Err(ServiceError::Configuration(
                "retry_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CommandServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for command service configuration.
#[derive(Debug, Default)]
pub struct CommandServiceConfigBuilder {
    resend_threshold: Option<Duration>,
    retry_interval: Option<Duration>,
}

impl CommandServiceConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resend threshold.
    #[must_use]
    pub fn resend_threshold(mut self, threshold: Duration) -> Self {
        self.resend_threshold = Some(threshold);
        self
    }

    /// Sets the retry loop period.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = Some(interval);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` if the result fails validation.
    pub fn build(self) -> Result<CommandServiceConfig, ServiceError> {
        let mut config = CommandServiceConfig::new();
        if let Some(threshold) = self.resend_threshold {
            config.resend_threshold = threshold;
        }
        if let Some(interval) = self.retry_interval {
            config.retry_interval = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Returns the host name from the environment, or `"localhost"`.
#[must_use]
pub fn default_host_name() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Configuration for a heartbeat service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Application name used in the heartbeat label.
    pub app_label: String,
    /// Application id stamped as `from_app`; inbound messages with this id are ignored.
    pub app_id: i32,
    /// Domain of the heartbeat topic.
    pub domain: DomainId,
    /// Time between heartbeats.
    #[serde(with = "duration_ms")]
    pub interval: Duration,
    /// Whether the sender starts with the service.
    pub start_sending: bool,
    /// Host identity used in the heartbeat label.
    #[serde(default = "default_host_name")]
    pub host_name: String,
}

impl HeartbeatConfig {
    /// Creates a heartbeat configuration with required fields.
    ///
    /// # Arguments
    /// * `app_label` - Application name
    /// * `app_id` - Application id
    /// * `domain` - Domain of the heartbeat topic
    #[must_use]
    pub fn new(app_label: impl Into<String>, app_id: i32, domain: DomainId) -> Self {
        Self {
            app_label: app_label.into(),
            app_id,
            domain,
            interval: DEFAULT_HEARTBEAT_INTERVAL,
            start_sending: true,
            host_name: default_host_name(),
        }
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets whether the sender starts with the service.
    #[must_use]
    pub const fn with_start_sending(mut self, start: bool) -> Self {
        self.start_sending = start;
        self
    }

    /// Sets the host name.
    #[must_use]
    pub fn with_host_name(mut self, host: impl Into<String>) -> Self {
        self.host_name = host.into();
        self
    }

    /// Returns the heartbeat label, `"{APP_LABEL}_{host}"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}_{}", self.app_label.to_uppercase(), self.host_name)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` if the application label is empty.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.app_label.trim().is_empty() {
            return Err(ServiceError::Configuration(
                "app_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for heartbeat configuration.
#[derive(Debug, Default)]
pub struct HeartbeatConfigBuilder {
    app_label: Option<String>,
    app_id: Option<i32>,
    domain: DomainId,
    interval: Option<Duration>,
    start_sending: Option<bool>,
    host_name: Option<String>,
}

impl HeartbeatConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application label.
    #[must_use]
    pub fn app_label(mut self, label: impl Into<String>) -> Self {
        self.app_label = Some(label.into());
        self
    }

    /// Sets the application id.
    #[must_use]
    pub const fn app_id(mut self, id: i32) -> Self {
        self.app_id = Some(id);
        self
    }

    /// Sets the domain.
    #[must_use]
    pub const fn domain(mut self, domain: DomainId) -> Self {
        self.domain = domain;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Sets whether the sender starts with the service.
    #[must_use]
    pub const fn start_sending(mut self, start: bool) -> Self {
        self.start_sending = Some(start);
        self
    }

    /// Sets the host name.
    #[must_use]
    pub fn host_name(mut self, host: impl Into<String>) -> Self {
        self.host_name = Some(host.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    /// Returns `ServiceError::Configuration` if the label or id is missing.
    pub fn build(self) -> Result<HeartbeatConfig, ServiceError> {
        let label = self
            .app_label
            .ok_or_else(|| ServiceError::Configuration("app_label is required".to_string()))?;
        let app_id = self
            .app_id
            .ok_or_else(|| ServiceError::Configuration("app_id is required".to_string()))?;

        let mut config = HeartbeatConfig::new(label, app_id, self.domain);
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(start) = self.start_sending {
            config.start_sending = start;
        }
        if let Some(host) = self.host_name {
            config.host_name = host;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_config_defaults() {
        let config = CommandServiceConfig::default();
        assert_eq!(config.resend_threshold, Duration::from_secs(10));
        assert_eq!(config.retry_interval, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_config_builder() {
        let config = CommandServiceConfigBuilder::new()
            .resend_threshold(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(config.resend_threshold, Duration::from_secs(3));
        assert_eq!(config.retry_interval, DEFAULT_RETRY_INTERVAL);

        let err = CommandServiceConfigBuilder::new()
            .retry_interval(Duration::ZERO)
            .build();
        assert!(matches!(err, Err(ServiceError::Configuration(_))));
    }

    #[test]
    fn test_heartbeat_label() {
        let config = HeartbeatConfig::new("tickwriter", 2, DomainId::new(0)).with_host_name("box7");
        assert_eq!(config.label(), "TICKWRITER_box7");
    }

    #[test]
    fn test_heartbeat_builder_requires_label_and_id() {
        assert!(HeartbeatConfigBuilder::new().app_id(1).build().is_err());
        assert!(HeartbeatConfigBuilder::new().app_label("x").build().is_err());
        assert!(HeartbeatConfigBuilder::new().app_label("  ").app_id(1).build().is_err());

        let config = HeartbeatConfigBuilder::new()
            .app_label("tick")
            .app_id(1)
            .domain(DomainId::new(4))
            .interval(Duration::from_millis(250))
            .start_sending(false)
            .host_name("h")
            .build()
            .unwrap();
        assert_eq!(config.domain, DomainId::new(4));
        assert_eq!(config.interval, Duration::from_millis(250));
        assert!(!config.start_sending);
    }

    #[test]
    fn test_default_host_name_not_empty() {
        assert!(!default_host_name().is_empty());
    }
}
