//! 조회 설정
//!
//! [`EnrichConfig`]는 core의 [`EnrichSettings`](fwscope_core::config::EnrichSettings)를
//! 기반으로 조회 레이어 전용 설정을 제공합니다.

use std::time::Duration;

use fwscope_core::config::EnrichSettings;

use crate::error::EnrichmentError;

/// whois 조회 설정
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    /// 조회 기능 활성화 여부
    pub enabled: bool,
    /// 실행할 외부 명령
    pub command: String,
    /// 조회 하드 타임아웃 (초)
    pub timeout_secs: u64,
    /// 조회 결과 채널 용량
    pub channel_capacity: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "whois".to_owned(),
            timeout_secs: 10,
            channel_capacity: 32,
        }
    }
}

impl EnrichConfig {
    /// core의 `EnrichSettings`에서 조회 설정을 생성합니다.
    pub fn from_core(settings: &EnrichSettings) -> Self {
        Self {
            enabled: settings.enabled,
            command: settings.command.clone(),
            timeout_secs: settings.timeout_secs,
            channel_capacity: settings.channel_capacity,
        }
    }

    /// 타임아웃을 `Duration`으로 반환합니다.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), EnrichmentError> {
        if self.command.is_empty() {
            return Err(EnrichmentError::Config {
                field: "command".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(EnrichmentError::Config {
                field: "timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(EnrichmentError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        EnrichConfig::default().validate().unwrap();
    }

    #[test]
    fn from_core_preserves_values() {
        let settings = EnrichSettings {
            enabled: false,
            command: "jwhois".to_owned(),
            timeout_secs: 5,
            channel_capacity: 8,
        };
        let config = EnrichConfig::from_core(&settings);
        assert!(!config.enabled);
        assert_eq!(config.command, "jwhois");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let config = EnrichConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_command() {
        let config = EnrichConfig {
            command: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
