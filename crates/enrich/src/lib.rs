#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`classifier`]: IP 주소 분류 (Multicast > Internal > External)
//! - [`whois`]: 외부 whois 서브프로세스 실행 및 응답 파싱
//! - [`cache`]: 조회 결과 메모이제이션 (중복 조회 방지)
//! - [`config`]: 조회 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 동시성 계약
//!
//! 캐시 맵은 이벤트 루프가 단독으로 변경합니다. 조회 워커는 결과를
//! 채널로 보고만 하고 캐시를 직접 쓰지 않으므로, 읽기 경로는 절대
//! 블로킹되지 않습니다.

pub mod cache;
pub mod classifier;
pub mod config;
pub mod error;
pub mod whois;

// --- 주요 타입 re-export ---

// 분류기
pub use classifier::Classifier;

// whois 조회
pub use whois::WhoisClient;

// 캐시
pub use cache::EnrichmentCache;

// 설정
pub use config::EnrichConfig;

// 에러
pub use error::EnrichmentError;
