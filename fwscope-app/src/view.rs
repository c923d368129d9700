//! 프레젠테이션 경계 — 읽기 전용 상태 스냅샷
//!
//! 렌더링 레이어는 이 모듈의 타입을 통해서만 세션 상태를 읽습니다.
//! 스냅샷은 전부 불변 참조이므로 어떤 소비자도 상태를 변경할 수
//! 없습니다.

use fwscope_core::types::{Category, EnrichmentStatus, FilterState, LogEvent, RunningStats};
use fwscope_log_stream::LogStreamError;

use crate::ports;
use crate::session::{Mode, Tab};

/// 세션 상태의 읽기 전용 스냅샷
pub struct ViewSnapshot<'a> {
    /// 필터 뷰의 이벤트 (도착 순서)
    pub events: Vec<&'a LogEvent>,
    /// 필터 뷰 내 커서 (빈 뷰면 None)
    pub cursor: Option<usize>,
    /// 활성 탭
    pub tab: Tab,
    /// 상호작용 모드
    pub mode: Mode,
    /// 활성 필터
    pub filters: &'a FilterState,
    /// 누적 카운터 (전체 스트림 기준)
    pub stats: &'a RunningStats,
    /// 검색 입력 버퍼
    pub search_buffer: &'a str,
    /// 상세 오버레이 (열려 있을 때만)
    pub detail: Option<DetailSnapshot<'a>>,
    /// 테일러 종결 에러 — 설정되어 있으면 종료만 가능하다
    pub fatal: Option<&'a LogStreamError>,
}

impl ViewSnapshot<'_> {
    /// 커서가 가리키는 이벤트를 반환합니다.
    pub fn selected(&self) -> Option<&LogEvent> {
        self.cursor.and_then(|c| self.events.get(c).copied())
    }
}

/// 상세 오버레이 스냅샷
///
/// `enrichment`의 세 상태: `None`은 아직 조회하지 않음,
/// `Some(Pending)`은 진행 중, `Some(Resolved(_))`는 완료입니다.
pub struct DetailSnapshot<'a> {
    /// 선택 시점에 복사된 이벤트
    pub event: &'a LogEvent,
    /// 출발지 IP 분류
    pub category: Category,
    /// whois 조회 상태
    pub enrichment: Option<&'a EnrichmentStatus>,
}

/// follow 모드의 한 줄 표현을 만듭니다.
///
/// 목적지 포트는 잘 알려진 서비스명이 있으면 그 이름으로 표시합니다.
pub fn follow_line(event: &LogEvent) -> String {
    let dpt = match event.dst_port {
        Some(port) => match ports::service_name(port, &event.proto) {
            Some(name) => name.to_owned(),
            None => port.to_string(),
        },
        None => String::new(),
    };
    format!(
        "{}  {:<8} {:<6} {:<16} {:<16} {}",
        event.timestamp.format("%H:%M:%S"),
        event.action(),
        event.proto,
        event.src,
        event.dst,
        dpt,
    )
}
