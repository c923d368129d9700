#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`tailer`]: 폴링 기반 파일 테일러 (로테이션 감지, 협력적 종료)
//! - [`parser`]: 방화벽 로그 라인 파서 (syslog/ISO 두 방언, IANA 프로토콜 표)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! LineTailer -> mpsc<RawLine> -> FirewallLogParser -> LogEvent -> session
//!      |
//!   mpsc<LogStreamError> (종결 에러, 이후 라인 없음)
//! ```

pub mod error;
pub mod parser;
pub mod tailer;

// --- 주요 타입 re-export ---

// 테일러
pub use tailer::{LineTailer, RawLine, TailConfig};

// 파서
pub use parser::FirewallLogParser;

// 에러
pub use error::LogStreamError;
