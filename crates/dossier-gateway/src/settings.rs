use dossier_agent::Intent;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `[stream]` section of the config file. All values in seconds except the
/// channel capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    #[serde(default = "default_stall_secs")]
    pub stall_secs: u64,
    #[serde(default = "default_research_timeout_secs")]
    pub research_timeout_secs: u64,
    #[serde(default = "default_conversation_timeout_secs")]
    pub conversation_timeout_secs: u64,
    /// Outbound frames buffered per request before sends wait on the client.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_keepalive_secs() -> u64 {
    15
}

fn default_stall_secs() -> u64 {
    45
}

fn default_research_timeout_secs() -> u64 {
    300
}

fn default_conversation_timeout_secs() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            keepalive_secs: default_keepalive_secs(),
            stall_secs: default_stall_secs(),
            research_timeout_secs: default_research_timeout_secs(),
            conversation_timeout_secs: default_conversation_timeout_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Runtime timing for one outbound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub keepalive: Duration,
    /// Silence from upstream after which a `status` warning is sent.
    pub stall: Duration,
    pub research_timeout: Duration,
    pub conversation_timeout: Duration,
    pub channel_capacity: usize,
}

impl StreamSettings {
    /// Hard wall-clock ceiling for a task of the given intent.
    pub fn timeout_for(&self, intent: Intent) -> Duration {
        match intent {
            Intent::Research => self.research_timeout,
            Intent::Conversational => self.conversation_timeout,
        }
    }
}

impl From<&StreamConfig> for StreamSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            keepalive: Duration::from_secs(config.keepalive_secs.max(1)),
            stall: Duration::from_secs(config.stall_secs.max(1)),
            research_timeout: Duration::from_secs(config.research_timeout_secs.max(1)),
            conversation_timeout: Duration::from_secs(config.conversation_timeout_secs.max(1)),
            channel_capacity: config.channel_capacity.max(1),
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StreamSettings::default();
        assert_eq!(settings.keepalive, Duration::from_secs(15));
        assert_eq!(settings.stall, Duration::from_secs(45));
        assert_eq!(settings.channel_capacity, 64);
        assert_eq!(
            settings.timeout_for(Intent::Research),
            Duration::from_secs(300)
        );
        assert_eq!(
            settings.timeout_for(Intent::Conversational),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let config = StreamConfig {
            keepalive_secs: 0,
            channel_capacity: 0,
            ..StreamConfig::default()
        };
        let settings = StreamSettings::from(&config);
        assert_eq!(settings.keepalive, Duration::from_secs(1));
        assert_eq!(settings.channel_capacity, 1);
    }
}
