//! 설정 관리 — fwscope.toml 파싱 및 런타임 설정
//!
//! [`FwscopeConfig`]는 모든 크레이트의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`FWSCOPE_TAIL_FILE=/var/log/ufw.log` 형식)
//! 3. 설정 파일 (`fwscope.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), fwscope_core::error::FwscopeError> {
//! use fwscope_core::config::FwscopeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = FwscopeConfig::load("fwscope.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = FwscopeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, FwscopeError};

/// Fwscope 통합 설정
///
/// `fwscope.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 크레이트는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FwscopeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 테일러 설정
    #[serde(default)]
    pub tail: TailSettings,
    /// whois 조회 설정
    #[serde(default)]
    pub enrich: EnrichSettings,
}

/// 일반 설정 (로깅)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 포맷 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 테일러 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TailSettings {
    /// 감시할 로그 파일 경로
    pub file: String,
    /// true이면 파일을 처음부터 읽음 (과거 기록 포함)
    pub history: bool,
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 라인 채널 용량
    pub line_channel_capacity: usize,
    /// 에러 채널 용량
    pub error_channel_capacity: usize,
}

impl Default for TailSettings {
    fn default() -> Self {
        Self {
            file: "/var/log/iptables.log".to_owned(),
            history: false,
            poll_interval_ms: 250,
            line_channel_capacity: 256,
            error_channel_capacity: 8,
        }
    }
}

/// whois 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichSettings {
    /// 조회 기능 활성화 여부
    pub enabled: bool,
    /// 실행할 외부 명령 (표준출력으로 응답을 내는 whois 호환 도구)
    pub command: String,
    /// 조회 하드 타임아웃 (초)
    pub timeout_secs: u64,
    /// 조회 결과 채널 용량
    pub channel_capacity: usize,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "whois".to_owned(),
            timeout_secs: 10,
            channel_capacity: 32,
        }
    }
}

impl FwscopeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FwscopeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, FwscopeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FwscopeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                FwscopeError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, FwscopeError> {
        toml::from_str(toml_str).map_err(|e| {
            FwscopeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `FWSCOPE_{SECTION}_{FIELD}`
    /// 예: `FWSCOPE_TAIL_FILE=/var/log/ufw.log`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "FWSCOPE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "FWSCOPE_GENERAL_LOG_FORMAT");

        // Tail
        override_string(&mut self.tail.file, "FWSCOPE_TAIL_FILE");
        override_bool(&mut self.tail.history, "FWSCOPE_TAIL_HISTORY");
        override_u64(&mut self.tail.poll_interval_ms, "FWSCOPE_TAIL_POLL_INTERVAL_MS");
        override_usize(
            &mut self.tail.line_channel_capacity,
            "FWSCOPE_TAIL_LINE_CHANNEL_CAPACITY",
        );
        override_usize(
            &mut self.tail.error_channel_capacity,
            "FWSCOPE_TAIL_ERROR_CHANNEL_CAPACITY",
        );

        // Enrich
        override_bool(&mut self.enrich.enabled, "FWSCOPE_ENRICH_ENABLED");
        override_string(&mut self.enrich.command, "FWSCOPE_ENRICH_COMMAND");
        override_u64(&mut self.enrich.timeout_secs, "FWSCOPE_ENRICH_TIMEOUT_SECS");
        override_usize(
            &mut self.enrich.channel_capacity,
            "FWSCOPE_ENRICH_CHANNEL_CAPACITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), FwscopeError> {
        const MAX_POLL_INTERVAL_MS: u64 = 60_000; // 1 minute
        const MAX_TIMEOUT_SECS: u64 = 300; // 5 minutes

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.tail.file.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "tail.file".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.tail.poll_interval_ms == 0 || self.tail.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(ConfigError::InvalidValue {
                field: "tail.poll_interval_ms".to_owned(),
                reason: format!("must be 1-{}", MAX_POLL_INTERVAL_MS),
            }
            .into());
        }

        if self.tail.line_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tail.line_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.tail.error_channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tail.error_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.enrich.command.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "enrich.command".to_owned(),
                reason: "must not be empty".to_owned(),
            }
            .into());
        }

        if self.enrich.timeout_secs == 0 || self.enrich.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "enrich.timeout_secs".to_owned(),
                reason: format!("must be 1-{}", MAX_TIMEOUT_SECS),
            }
            .into());
        }

        if self.enrich.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enrich.channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 환경변수 값으로 문자열 필드를 덮어씁니다.
fn override_string(field: &mut String, var: &str) {
    if let Ok(value) = std::env::var(var)
        && !value.is_empty()
    {
        *field = value;
    }
}

/// 환경변수 값으로 bool 필드를 덮어씁니다.
fn override_bool(field: &mut bool, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse::<bool>() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(var, value, "ignoring non-boolean environment override"),
        }
    }
}

/// 환경변수 값으로 u64 필드를 덮어씁니다.
fn override_u64(field: &mut u64, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse::<u64>() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(var, value, "ignoring non-numeric environment override"),
        }
    }
}

/// 환경변수 값으로 usize 필드를 덮어씁니다.
fn override_usize(field: &mut usize, var: &str) {
    if let Ok(value) = std::env::var(var) {
        match value.parse::<usize>() {
            Ok(parsed) => *field = parsed,
            Err(_) => warn!(var, value, "ignoring non-numeric environment override"),
        }
    }
}
