//! 조회(enrichment) 에러 타입
//!
//! [`EnrichmentError`]는 외부 whois 실행 과정의 실패를 표현합니다.
//! 조회 실패는 호출 경계에서 빈 결과로 흡수되므로, 이 타입은 주로
//! 내부 실행 경로와 설정 검증에서 쓰입니다.

use fwscope_core::error::{EnrichError, FwscopeError};

/// 조회 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    /// 외부 명령 실행 실패 (설치되지 않음 등)
    #[error("exec error: {command}: {reason}")]
    Exec {
        /// 실행한 명령
        command: String,
        /// 에러 사유
        reason: String,
    },

    /// 외부 명령이 0이 아닌 종료 코드로 끝남
    #[error("command '{command}' exited with status {status}")]
    NonZeroExit {
        /// 실행한 명령
        command: String,
        /// 종료 상태
        status: String,
    },

    /// 하드 타임아웃 초과
    #[error("lookup timed out after {secs}s")]
    Timeout {
        /// 타임아웃 (초)
        secs: u64,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },
}

impl From<EnrichmentError> for FwscopeError {
    fn from(err: EnrichmentError) -> Self {
        FwscopeError::Enrich(EnrichError::Lookup(err.to_string()))
    }
}
