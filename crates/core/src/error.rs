//! 에러 타입 — 도메인별 에러 정의

/// Fwscope 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum FwscopeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 스트림(테일링/파싱) 에러
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// 조회(enrichment) 에러
    #[error("enrich error: {0}")]
    Enrich(#[from] EnrichError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 로그 스트림 에러
///
/// 테일러의 종결 에러는 파이프라인에 치명적이며, 라인 단위 파싱 실패는
/// 호출자가 해당 라인을 건너뛰는 것으로 흡수합니다.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// 테일러 종결 에러 (권한 상실, 파일 소실 등)
    #[error("tailer failed: {0}")]
    Tailer(String),

    /// 라인 파싱 실패
    #[error("parse failed: {0}")]
    Parse(String),
}

/// 조회(enrichment) 에러
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// 외부 조회 실패
    #[error("lookup failed: {0}")]
    Lookup(String),
}
