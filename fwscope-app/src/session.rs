//! 세션 상태 머신 — 파이프라인 상태의 단독 소유자
//!
//! [`Session`]은 권위 이벤트 컬렉션, 파생 필터 뷰, 누적 카운터, 커서,
//! 상세 오버레이, 활성 탭을 소유하는 유한 상태 머신입니다. 상태는
//! `{Browsing, Searching, DetailOpen} × {Logs, Stats, Filters}`이며,
//! 새 이벤트 알림과 사용자 의도라는 두 입력 계열이 전이를 일으킵니다.
//!
//! # 단일 작성자 규율
//!
//! 모든 변경은 이벤트 루프 한 곳에서 [`Session::update`]를 통해서만
//! 일어납니다. 덕분에 `LogEvent`/`FilterState`/`RunningStats` 주위에
//! 락이 필요 없습니다. 부수 효과(조회 시작, 종료)는 직접 실행하지 않고
//! [`Command`] 큐로 반환하여 런타임이 실행합니다.
//!
//! # 불변식
//!
//! - 권위 컬렉션에 추가된 이벤트는 절대 변경되지 않는다.
//! - 필터 뷰는 도착 순서를 보존하는 재파생 가능한 부분 수열이다.
//! - 카운터는 필터와 무관하게 전체 스트림을 집계한다.
//! - 새 데이터가 수동으로 이동한 커서를 빼앗지 않는다 (auto-follow는
//!   커서가 정확히 마지막 행에 있고 상세 오버레이가 닫혀 있을 때만).

use fwscope_core::types::{
    Action, Category, EnrichmentResult, FilterState, LogEvent, RunningStats,
};
use fwscope_enrich::{Classifier, EnrichmentCache};
use fwscope_log_stream::{FirewallLogParser, LogStreamError, RawLine};

use crate::intent::UserIntent;
use crate::view::{DetailSnapshot, ViewSnapshot};

/// PageUp/PageDown 한 번에 이동하는 행 수
const PAGE_STEP: usize = 20;

/// 활성 탭
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// 로그 테이블
    Logs,
    /// 누적 통계
    Stats,
    /// 활성 필터
    Filters,
}

impl Tab {
    /// 다음 탭으로 순환합니다.
    pub fn next(self) -> Self {
        match self {
            Self::Logs => Self::Stats,
            Self::Stats => Self::Filters,
            Self::Filters => Self::Logs,
        }
    }
}

/// 상호작용 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// 일반 탐색
    Browsing,
    /// IP 검색 입력이 열려 있음
    Searching,
    /// 상세 오버레이가 열려 있음
    DetailOpen,
}

/// 세션으로 들어오는 메시지
///
/// 테일러 워커, 조회 워커, 사용자 입력이 전부 이 타입으로 합류합니다.
#[derive(Debug)]
pub enum Msg {
    /// 테일러가 읽은 원시 라인
    Line(RawLine),
    /// 테일러 종결 에러 — 이후 세션은 종료 의도만 받는다
    StreamFailed(LogStreamError),
    /// 조회 워커가 보고한 결과
    Enriched {
        /// 조회 대상 IP
        ip: String,
        /// 조회 결과 (빈 결과 포함)
        result: EnrichmentResult,
    },
    /// 사용자 의도
    Intent(UserIntent),
}

/// 세션이 런타임에 위임하는 부수 효과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 주어진 IP에 대한 비동기 whois 조회 시작
    StartLookup(String),
    /// 이벤트 루프 종료
    Quit,
}

/// 상세 오버레이 스냅샷
///
/// 선택 시점의 이벤트를 값으로 복사하므로, 이후 도착하는 이벤트나
/// 필터 변경이 사용자가 보고 있는 내용을 바꿀 수 없습니다.
#[derive(Debug, Clone)]
pub struct DetailView {
    /// 선택된 이벤트의 방어적 복사본
    pub event: LogEvent,
    /// 출발지 IP 분류
    pub category: Category,
}

/// 파이프라인 세션
pub struct Session {
    /// 라인 파서
    parser: FirewallLogParser,
    /// IP 분류기 (시작 시점 스냅샷)
    classifier: Classifier,
    /// 권위 이벤트 컬렉션 (append 전용, 도착 순서)
    all: Vec<LogEvent>,
    /// 필터 뷰 — `all`에 대한 인덱스, 도착 순서 보존
    filtered: Vec<usize>,
    /// 필터 뷰 내 커서 (빈 뷰면 None)
    cursor: Option<usize>,
    /// 활성 탭
    tab: Tab,
    /// 상호작용 모드
    mode: Mode,
    /// 활성 필터
    filters: FilterState,
    /// 검색 입력 버퍼
    search_buffer: String,
    /// 누적 카운터 (전체 스트림 기준)
    stats: RunningStats,
    /// whois 조회 캐시 (이 세션이 단독 변경)
    cache: EnrichmentCache,
    /// 열려 있는 상세 오버레이
    detail: Option<DetailView>,
    /// 테일러 종결 에러 — 설정되면 세션이 동결된다
    fatal: Option<LogStreamError>,
}

impl Session {
    /// 새 세션을 생성합니다.
    pub fn new(classifier: Classifier) -> Result<Self, LogStreamError> {
        Ok(Self {
            parser: FirewallLogParser::new()?,
            classifier,
            all: Vec::new(),
            filtered: Vec::new(),
            cursor: None,
            tab: Tab::Logs,
            mode: Mode::Browsing,
            filters: FilterState::default(),
            search_buffer: String::new(),
            stats: RunningStats::default(),
            cache: EnrichmentCache::new(),
            detail: None,
            fatal: None,
        })
    }

    /// 메시지 하나를 처리하고 실행할 부수 효과를 반환합니다.
    pub fn update(&mut self, msg: Msg) -> Vec<Command> {
        match msg {
            Msg::Line(raw) => {
                if self.fatal.is_none() {
                    self.handle_line(&raw);
                }
                Vec::new()
            }
            Msg::StreamFailed(err) => {
                self.fatal = Some(err);
                Vec::new()
            }
            Msg::Enriched { ip, result } => {
                self.cache.resolve(&ip, result);
                Vec::new()
            }
            Msg::Intent(intent) => self.handle_intent(intent),
        }
    }

    /// 지금까지 수집한 총 이벤트 수를 반환합니다.
    pub fn total(&self) -> u64 {
        self.stats.total
    }

    /// 가장 최근에 수집된 이벤트를 반환합니다.
    pub fn latest(&self) -> Option<&LogEvent> {
        self.all.last()
    }

    /// 프레젠테이션 경계 — 읽기 전용 스냅샷을 반환합니다.
    pub fn view(&self) -> ViewSnapshot<'_> {
        ViewSnapshot {
            events: self.filtered.iter().map(|&i| &self.all[i]).collect(),
            cursor: self.cursor,
            tab: self.tab,
            mode: self.mode,
            filters: &self.filters,
            stats: &self.stats,
            search_buffer: &self.search_buffer,
            detail: self.detail.as_ref().map(|d| DetailSnapshot {
                event: &d.event,
                category: d.category,
                enrichment: self.cache.status(&d.event.src),
            }),
            fatal: self.fatal.as_ref(),
        }
    }

    /// 원시 라인을 파싱하여 수집합니다.
    ///
    /// 파싱 실패는 라인을 조용히 건너뜁니다 — 이벤트도, 카운터 증가도,
    /// 로그도 남기지 않습니다.
    fn handle_line(&mut self, raw: &RawLine) {
        let Ok(event) = self.parser.parse(&raw.text()) else {
            return;
        };
        self.add_event(event);
    }

    /// 이벤트를 권위 컬렉션에 추가하고 파생 상태를 갱신합니다.
    ///
    /// 카운터는 필터와 무관하게 무조건 갱신되고, 필터 검사는 전체 재스캔
    /// 없이 새 이벤트 하나에만 수행됩니다.
    fn add_event(&mut self, event: LogEvent) {
        // 추가 전에 커서가 필터 뷰 끝에 있었는지 기억한다 (빈 뷰 포함)
        let was_at_tail = match self.cursor {
            None => true,
            Some(c) => c + 1 == self.filtered.len(),
        };

        self.stats.observe(&event);
        let matches = self.filters.matches(&event);
        let index = self.all.len();
        self.all.push(event);

        if matches {
            self.filtered.push(index);
            // auto-follow: 사용자가 스크롤로 벗어나 있었거나 상세 오버레이가
            // 열려 있으면 커서를 건드리지 않는다
            if was_at_tail && self.mode != Mode::DetailOpen {
                self.cursor = Some(self.filtered.len() - 1);
            }
        }
    }

    /// 필터 뷰를 권위 컬렉션에서 다시 파생합니다.
    ///
    /// 필터 술어가 바뀔 때마다 호출되며, 커서를 `[0, len-1]`로 클램프하고
    /// 뷰가 비면 빈 상태(None)로 되돌립니다.
    fn apply_filters(&mut self) {
        self.filtered.clear();
        for (index, event) in self.all.iter().enumerate() {
            if self.filters.matches(event) {
                self.filtered.push(index);
            }
        }
        self.cursor = if self.filtered.is_empty() {
            None
        } else {
            let last = self.filtered.len() - 1;
            Some(self.cursor.map_or(last, |c| c.min(last)))
        };
    }

    /// 사용자 의도를 처리합니다.
    fn handle_intent(&mut self, intent: UserIntent) -> Vec<Command> {
        if intent == UserIntent::Quit {
            return vec![Command::Quit];
        }
        // 테일러 종결 에러 이후에는 종료 외의 모든 의도를 무시한다
        if self.fatal.is_some() {
            return Vec::new();
        }

        match self.mode {
            Mode::DetailOpen => {
                if matches!(intent, UserIntent::CloseDetail | UserIntent::OpenDetail) {
                    self.detail = None;
                    self.mode = Mode::Browsing;
                }
                Vec::new()
            }
            Mode::Searching => {
                match intent {
                    UserIntent::EditSearch(value) => {
                        self.search_buffer = value;
                        self.filters.ip_substr = self.search_buffer.clone();
                        self.apply_filters();
                    }
                    UserIntent::CloseSearch => {
                        self.mode = Mode::Browsing;
                    }
                    _ => {}
                }
                Vec::new()
            }
            Mode::Browsing => self.handle_browsing_intent(intent),
        }
    }

    /// Browsing 모드의 의도 처리.
    fn handle_browsing_intent(&mut self, intent: UserIntent) -> Vec<Command> {
        match intent {
            UserIntent::NextTab => {
                self.tab = self.tab.next();
            }
            UserIntent::SelectTab(tab) => {
                self.tab = tab;
            }
            UserIntent::ClearFilters => {
                self.filters = FilterState::default();
                self.search_buffer.clear();
                self.apply_filters();
            }

            // 이하 의도는 로그 탭에서만 의미가 있다
            UserIntent::CursorUp if self.tab == Tab::Logs => {
                self.move_cursor_by(-1);
            }
            UserIntent::CursorDown if self.tab == Tab::Logs => {
                self.move_cursor_by(1);
            }
            UserIntent::PageUp if self.tab == Tab::Logs => {
                self.move_cursor_by(-(PAGE_STEP as isize));
            }
            UserIntent::PageDown if self.tab == Tab::Logs => {
                self.move_cursor_by(PAGE_STEP as isize);
            }
            UserIntent::OpenDetail if self.tab == Tab::Logs => {
                return self.open_detail();
            }
            UserIntent::OpenSearch if self.tab == Tab::Logs => {
                self.mode = Mode::Searching;
            }
            UserIntent::ToggleDropFilter if self.tab == Tab::Logs => {
                self.filters.toggle_action(Action::Drop);
                self.apply_filters();
            }
            UserIntent::ToggleAcceptFilter if self.tab == Tab::Logs => {
                self.filters.toggle_action(Action::Accept);
                self.apply_filters();
            }
            UserIntent::ToggleTcpFilter if self.tab == Tab::Logs => {
                self.filters.toggle_proto("TCP");
                self.apply_filters();
            }
            UserIntent::ToggleUdpFilter if self.tab == Tab::Logs => {
                self.filters.toggle_proto("UDP");
                self.apply_filters();
            }

            _ => {}
        }
        Vec::new()
    }

    /// 커서를 상대 이동하고 `[0, len-1]`로 클램프합니다.
    fn move_cursor_by(&mut self, delta: isize) {
        let Some(cursor) = self.cursor else {
            return;
        };
        let last = self.filtered.len().saturating_sub(1);
        let moved = cursor.saturating_add_signed(delta).min(last);
        self.cursor = Some(moved);
    }

    /// 선택된 이벤트의 상세 오버레이를 엽니다.
    ///
    /// 출발지가 External이고 캐시에 해당 키가 없을 때만 조회를 시작합니다.
    /// 진행 중이거나 완료된 키에 대해서는 중복 조회를 띄우지 않습니다.
    fn open_detail(&mut self) -> Vec<Command> {
        let Some(cursor) = self.cursor else {
            return Vec::new();
        };
        let event = self.all[self.filtered[cursor]].clone();
        let category = self.classifier.categorize(&event.src);
        let src = event.src.clone();

        self.detail = Some(DetailView { event, category });
        self.mode = Mode::DetailOpen;

        if category == Category::External && self.cache.begin(&src) {
            return vec![Command::StartLookup(src)];
        }
        Vec::new()
    }
}
