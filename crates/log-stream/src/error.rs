//! 로그 스트림 에러 타입
//!
//! [`LogStreamError`]는 테일링과 파싱에서 발생하는 모든 에러를 표현합니다.
//! `From<LogStreamError> for FwscopeError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use fwscope_core::error::{FwscopeError, StreamError};

/// 로그 스트림 도메인 에러
///
/// 파싱 실패는 호출자가 해당 라인을 건너뛰는 것으로 흡수하는 복구 가능
/// 에러이고, 나머지는 테일러 태스크를 종결시키는 치명적 에러입니다.
#[derive(Debug, thiserror::Error)]
pub enum LogStreamError {
    /// 로그 라인 파싱 실패 — 라인 건너뛰기 신호
    #[error("parse error: {reason}")]
    Parse {
        /// 실패 사유
        reason: String,
    },

    /// 파일 열기 실패
    #[error("open error: {path}: {reason}")]
    Open {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 읽기 실패
    #[error("read error: {path}: {reason}")]
    Read {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 파일 상태 확인 실패 (로테이션 감지 중 파일 소실 등)
    #[error("watch error: {path}: {reason}")]
    Watch {
        /// 파일 경로
        path: String,
        /// 에러 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogStreamError> for FwscopeError {
    fn from(err: LogStreamError) -> Self {
        match err {
            LogStreamError::Parse { reason } => FwscopeError::Stream(StreamError::Parse(reason)),
            other => FwscopeError::Stream(StreamError::Tailer(other.to_string())),
        }
    }
}
