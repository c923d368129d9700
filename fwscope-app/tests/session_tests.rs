//! Session 리듀서 통합 테스트
//!
//! 세션 상태 머신의 계약을 공개 API(메시지/의도/스냅샷)로만 검증합니다:
//! 수집과 카운터, auto-follow, 필터 재파생과 커서 클램프, 상세 오버레이
//! 스냅샷, 조회 메모이제이션, 종결 에러 동결.

use bytes::Bytes;

use fwscope_app::intent::UserIntent;
use fwscope_app::session::{Command, Mode, Msg, Session, Tab};
use fwscope_core::types::{Action, Category, EnrichmentResult, EnrichmentStatus};
use fwscope_enrich::Classifier;
use fwscope_log_stream::tailer::RawLine;

/// 192.168.0.0/16만 내부로 보는 세션
fn session() -> Session {
    let subnets = vec!["192.168.0.0/16".parse().unwrap()];
    Session::new(Classifier::with_subnets(subnets)).unwrap()
}

fn line_msg(line: &str) -> Msg {
    Msg::Line(RawLine::new(Bytes::from(line.to_owned())))
}

fn intent(i: UserIntent) -> Msg {
    Msg::Intent(i)
}

fn drop_udp_line(src: &str) -> String {
    format!(
        "Feb  3 10:02:11 router kernel: [DROP] IN=eth1 OUT= SRC={src} DST=192.168.1.1 LEN=40 TTL=64 PROTO=UDP SPT=9999 DPT=53"
    )
}

fn accept_tcp_line(src: &str) -> String {
    format!(
        "Feb  3 10:02:12 router kernel: [ACCEPT] IN=eth0 OUT= SRC={src} DST=192.168.1.1 PROTO=TCP SPT=40000 DPT=443"
    )
}

#[test]
fn example_line_parses_end_to_end() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));

    let view = session.view();
    assert_eq!(view.events.len(), 1);
    let event = view.events[0];
    assert_eq!(event.action(), Action::Drop);
    assert_eq!(event.proto, "UDP");
    assert_eq!(event.src, "5.6.7.8");
    assert_eq!(event.dst_port, Some(53));
    drop(view);

    // 192.168.0.0/16 스냅샷에서 5.6.7.8은 External
    let commands = session.update(intent(UserIntent::OpenDetail));
    assert_eq!(commands, vec![Command::StartLookup("5.6.7.8".to_owned())]);
    let view = session.view();
    let detail = view.detail.expect("detail overlay should be open");
    assert_eq!(detail.category, Category::External);
}

#[test]
fn garbage_line_leaves_state_unaffected() {
    let mut session = session();
    session.update(line_msg("this is not a log line"));

    let view = session.view();
    assert!(view.events.is_empty());
    assert_eq!(view.cursor, None);
    assert_eq!(view.stats.total, 0);
    assert!(view.stats.by_action.is_empty());
}

#[test]
fn total_counts_the_unfiltered_stream() {
    let mut session = session();
    for i in 0..3 {
        session.update(line_msg(&drop_udp_line(&format!("5.6.7.{i}"))));
    }
    for i in 0..2 {
        session.update(line_msg(&accept_tcp_line(&format!("9.9.9.{i}"))));
    }

    session.update(intent(UserIntent::ToggleDropFilter));
    let view = session.view();
    assert_eq!(view.events.len(), 3);
    // 카운터는 필터와 무관하게 전체 스트림을 본다
    assert_eq!(view.stats.total, 5);
    assert_eq!(view.stats.by_action.get("ACCEPT"), Some(&2));
}

#[test]
fn auto_follow_advances_cursor_at_tail() {
    let mut session = session();
    for i in 0..5 {
        session.update(line_msg(&drop_udp_line(&format!("5.6.7.{i}"))));
    }
    assert_eq!(session.view().cursor, Some(4));

    // 커서가 마지막 행에 있으면 새 이벤트를 따라간다
    session.update(line_msg(&drop_udp_line("5.6.7.99")));
    assert_eq!(session.view().cursor, Some(5));
}

#[test]
fn scrolled_away_cursor_is_left_untouched() {
    let mut session = session();
    for i in 0..5 {
        session.update(line_msg(&drop_udp_line(&format!("5.6.7.{i}"))));
    }
    for _ in 0..2 {
        session.update(intent(UserIntent::CursorUp));
    }
    assert_eq!(session.view().cursor, Some(2));

    // 새 데이터가 수동으로 움직인 커서를 빼앗으면 안 된다
    session.update(line_msg(&drop_udp_line("5.6.7.99")));
    assert_eq!(session.view().cursor, Some(2));
}

#[test]
fn auto_follow_is_paused_while_detail_is_open() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.1")));
    session.update(intent(UserIntent::OpenDetail));
    assert_eq!(session.view().mode, Mode::DetailOpen);

    session.update(line_msg(&drop_udp_line("5.6.7.2")));
    // 상세 오버레이가 열린 동안에는 커서가 따라가지 않는다
    assert_eq!(session.view().cursor, Some(0));

    session.update(intent(UserIntent::CloseDetail));
    assert_eq!(session.view().mode, Mode::Browsing);
}

#[test]
fn cursor_moves_are_clamped() {
    let mut session = session();
    for i in 0..3 {
        session.update(line_msg(&drop_udp_line(&format!("5.6.7.{i}"))));
    }

    session.update(intent(UserIntent::PageUp));
    assert_eq!(session.view().cursor, Some(0));
    session.update(intent(UserIntent::CursorUp));
    assert_eq!(session.view().cursor, Some(0));
    session.update(intent(UserIntent::PageDown));
    assert_eq!(session.view().cursor, Some(2));
    session.update(intent(UserIntent::CursorDown));
    assert_eq!(session.view().cursor, Some(2));
}

#[test]
fn filter_rescan_is_idempotent() {
    let mut session = session();
    for i in 0..4 {
        session.update(line_msg(&drop_udp_line(&format!("5.6.7.{i}"))));
        session.update(line_msg(&accept_tcp_line(&format!("9.9.9.{i}"))));
    }

    session.update(intent(UserIntent::OpenSearch));
    session.update(intent(UserIntent::EditSearch("5.6.".to_owned())));
    let first: Vec<String> = session.view().events.iter().map(|e| e.src.clone()).collect();
    let first_cursor = session.view().cursor;

    // 같은 술어로 다시 재파생해도 결과는 동일해야 한다
    session.update(intent(UserIntent::EditSearch("5.6.".to_owned())));
    let second: Vec<String> = session.view().events.iter().map(|e| e.src.clone()).collect();
    assert_eq!(first, second);
    assert_eq!(first_cursor, session.view().cursor);
}

#[test]
fn toggle_filter_twice_restores_full_view() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(line_msg(&accept_tcp_line("9.9.9.9")));

    session.update(intent(UserIntent::ToggleDropFilter));
    assert_eq!(session.view().events.len(), 1);

    session.update(intent(UserIntent::ToggleDropFilter));
    assert_eq!(session.view().events.len(), 2);
    assert!(session.view().filters.is_empty());
}

#[test]
fn different_action_filter_replaces_the_previous_one() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(line_msg(&accept_tcp_line("9.9.9.9")));

    session.update(intent(UserIntent::ToggleDropFilter));
    session.update(intent(UserIntent::ToggleAcceptFilter));
    let view = session.view();
    assert_eq!(view.filters.action, Some(Action::Accept));
    assert_eq!(view.events.len(), 1);
    assert_eq!(view.events[0].src, "9.9.9.9");
}

#[test]
fn filters_combine_with_and() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(line_msg(&accept_tcp_line("5.6.7.8")));
    session.update(line_msg(&accept_tcp_line("9.9.9.9")));

    session.update(intent(UserIntent::ToggleAcceptFilter));
    session.update(intent(UserIntent::ToggleTcpFilter));
    session.update(intent(UserIntent::OpenSearch));
    session.update(intent(UserIntent::EditSearch("5.6".to_owned())));

    let view = session.view();
    assert_eq!(view.events.len(), 1);
    assert_eq!(view.events[0].src, "5.6.7.8");
    assert_eq!(view.events[0].proto, "TCP");
}

#[test]
fn empty_filtered_view_uses_sentinel_cursor() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(intent(UserIntent::OpenSearch));
    session.update(intent(UserIntent::EditSearch("no-such-ip".to_owned())));

    let view = session.view();
    assert!(view.events.is_empty());
    assert_eq!(view.cursor, None);
    assert!(view.selected().is_none());
}

#[test]
fn cursor_is_clamped_when_the_view_shrinks() {
    let mut session = session();
    for i in 0..5 {
        session.update(line_msg(&drop_udp_line(&format!("5.6.7.{i}"))));
    }
    session.update(line_msg(&accept_tcp_line("9.9.9.9")));
    assert_eq!(session.view().cursor, Some(5));

    // ACCEPT 하나만 남기면 커서는 [0, len-1]로 클램프된다
    session.update(intent(UserIntent::ToggleAcceptFilter));
    assert_eq!(session.view().events.len(), 1);
    assert_eq!(session.view().cursor, Some(0));
}

#[test]
fn clear_filters_resets_everything() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(line_msg(&accept_tcp_line("9.9.9.9")));

    session.update(intent(UserIntent::ToggleDropFilter));
    session.update(intent(UserIntent::ToggleUdpFilter));
    session.update(intent(UserIntent::OpenSearch));
    session.update(intent(UserIntent::EditSearch("5.6".to_owned())));
    session.update(intent(UserIntent::CloseSearch));

    session.update(intent(UserIntent::ClearFilters));
    let view = session.view();
    assert!(view.filters.is_empty());
    assert_eq!(view.search_buffer, "");
    assert_eq!(view.events.len(), 2);
}

#[test]
fn search_commits_on_close_and_returns_to_browsing() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(line_msg(&drop_udp_line("7.7.7.7")));

    session.update(intent(UserIntent::OpenSearch));
    assert_eq!(session.view().mode, Mode::Searching);
    session.update(intent(UserIntent::EditSearch("5.6".to_owned())));
    session.update(intent(UserIntent::CloseSearch));

    let view = session.view();
    assert_eq!(view.mode, Mode::Browsing);
    assert_eq!(view.filters.ip_substr, "5.6");
    assert_eq!(view.events.len(), 1);
}

#[test]
fn detail_snapshot_is_immune_to_later_events() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(intent(UserIntent::OpenDetail));

    // 오버레이가 열린 뒤 도착하는 이벤트는 스냅샷에 영향이 없다
    for i in 0..10 {
        session.update(line_msg(&drop_udp_line(&format!("7.7.7.{i}"))));
    }
    let view = session.view();
    let detail = view.detail.expect("detail overlay should be open");
    assert_eq!(detail.event.src, "5.6.7.8");
}

#[test]
fn enrichment_is_memoized_per_source_ip() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));

    // 첫 상세 열기만 조회를 시작한다
    let commands = session.update(intent(UserIntent::OpenDetail));
    assert_eq!(commands, vec![Command::StartLookup("5.6.7.8".to_owned())]);
    assert_eq!(
        session.view().detail.unwrap().enrichment,
        Some(&EnrichmentStatus::Pending)
    );

    // 진행 중에 다시 열어도 두 번째 조회는 나가지 않는다
    session.update(intent(UserIntent::CloseDetail));
    let commands = session.update(intent(UserIntent::OpenDetail));
    assert!(commands.is_empty());
    assert_eq!(
        session.view().detail.unwrap().enrichment,
        Some(&EnrichmentStatus::Pending)
    );

    // 결과 도착 후에는 캐시된 결과가 보인다 — 역시 재조회 없음
    session.update(intent(UserIntent::CloseDetail));
    let result = EnrichmentResult {
        org: Some("Example Org".to_owned()),
        ..Default::default()
    };
    session.update(Msg::Enriched {
        ip: "5.6.7.8".to_owned(),
        result: result.clone(),
    });
    let commands = session.update(intent(UserIntent::OpenDetail));
    assert!(commands.is_empty());
    assert_eq!(
        session.view().detail.unwrap().enrichment,
        Some(&EnrichmentStatus::Resolved(result))
    );
}

#[test]
fn internal_source_does_not_trigger_a_lookup() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("192.168.1.50")));

    let commands = session.update(intent(UserIntent::OpenDetail));
    assert!(commands.is_empty());
    let view = session.view();
    let detail = view.detail.expect("detail overlay should be open");
    assert_eq!(detail.category, Category::Internal);
    // 조회를 시작한 적이 없으므로 "아직 조회하지 않음" 상태
    assert!(detail.enrichment.is_none());
}

#[test]
fn empty_lookup_result_is_terminal() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(intent(UserIntent::OpenDetail));
    session.update(Msg::Enriched {
        ip: "5.6.7.8".to_owned(),
        result: EnrichmentResult::default(),
    });

    // 빈 결과도 종결적으로 캐시된다 — 재시도 없음
    session.update(intent(UserIntent::CloseDetail));
    let commands = session.update(intent(UserIntent::OpenDetail));
    assert!(commands.is_empty());
    assert!(matches!(
        session.view().detail.unwrap().enrichment,
        Some(EnrichmentStatus::Resolved(r)) if r.is_empty()
    ));
}

#[test]
fn stream_failure_freezes_the_session() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));
    session.update(Msg::StreamFailed(
        fwscope_log_stream::LogStreamError::Watch {
            path: "/var/log/iptables.log".to_owned(),
            reason: "no such file".to_owned(),
        },
    ));

    assert!(session.view().fatal.is_some());

    // 종결 에러 이후에는 종료 외의 의도가 전부 무시된다
    session.update(intent(UserIntent::ToggleDropFilter));
    session.update(intent(UserIntent::CursorUp));
    session.update(intent(UserIntent::OpenDetail));
    let view = session.view();
    assert!(view.filters.is_empty());
    assert!(view.detail.is_none());
    drop(view);

    // 에러 이후 도착한 라인도 수집되지 않는다
    session.update(line_msg(&drop_udp_line("9.9.9.9")));
    assert_eq!(session.view().stats.total, 1);

    let commands = session.update(intent(UserIntent::Quit));
    assert_eq!(commands, vec![Command::Quit]);
}

#[test]
fn tab_switching_and_gating() {
    let mut session = session();
    session.update(line_msg(&drop_udp_line("5.6.7.8")));

    session.update(intent(UserIntent::NextTab));
    assert_eq!(session.view().tab, Tab::Stats);

    // 로그 탭이 아니면 빠른 필터는 동작하지 않는다
    session.update(intent(UserIntent::ToggleDropFilter));
    assert!(session.view().filters.is_empty());

    session.update(intent(UserIntent::SelectTab(Tab::Logs)));
    assert_eq!(session.view().tab, Tab::Logs);
    session.update(intent(UserIntent::ToggleDropFilter));
    assert_eq!(session.view().filters.action, Some(Action::Drop));
}
