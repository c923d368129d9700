//! 이벤트 루프 런타임 — 채널 배선과 부수 효과 실행
//!
//! 단일 포그라운드 루프가 모든 세션 변경을 소유합니다. 테일러 워커와는
//! 라인/에러 채널로만, 조회 워커와는 결과 채널로만 통신하므로 세션 상태
//! 주위에 락이 필요 없습니다.
//!
//! 조회 워커는 미해결 요청당 하나씩 생성되는 단명 태스크이며, 결과를
//! 같은 이벤트 루프 큐로 보고합니다. 루프가 먼저 종료되면 뒤늦은 결과
//! 메시지는 무해하게 버려집니다.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use fwscope_core::config::FwscopeConfig;
use fwscope_core::types::EnrichmentResult;
use fwscope_enrich::{EnrichConfig, WhoisClient};
use fwscope_log_stream::{LogStreamError, RawLine};

use crate::intent::UserIntent;
use crate::session::{Command, Msg, Session};
use crate::view;

/// 파이프라인 이벤트 루프
pub struct Runtime {
    /// 세션 (단독 소유)
    session: Session,
    /// 테일러 라인 채널
    line_rx: mpsc::Receiver<RawLine>,
    /// 테일러 종결 에러 채널
    error_rx: mpsc::Receiver<LogStreamError>,
    /// 조회 결과 송신측 (워커에 복제해 전달)
    enrich_tx: mpsc::Sender<(String, EnrichmentResult)>,
    /// 조회 결과 수신 채널
    enrich_rx: mpsc::Receiver<(String, EnrichmentResult)>,
    /// whois 클라이언트
    whois: WhoisClient,
    /// 조회 기능 활성화 여부
    enrich_enabled: bool,
    /// 테일러 협력적 종료 토큰
    tailer_shutdown: CancellationToken,
}

impl Runtime {
    /// 런타임을 구성합니다.
    pub fn new(
        config: &FwscopeConfig,
        session: Session,
        line_rx: mpsc::Receiver<RawLine>,
        error_rx: mpsc::Receiver<LogStreamError>,
        tailer_shutdown: CancellationToken,
    ) -> Self {
        let enrich_config = EnrichConfig::from_core(&config.enrich);
        let (enrich_tx, enrich_rx) = mpsc::channel(enrich_config.channel_capacity);
        Self {
            session,
            line_rx,
            error_rx,
            enrich_tx,
            enrich_rx,
            whois: WhoisClient::new(&enrich_config),
            enrich_enabled: enrich_config.enabled,
            tailer_shutdown,
        }
    }

    /// 이벤트 루프를 실행합니다. 종료 의도가 처리되면 반환합니다.
    pub async fn run(mut self) {
        let mut lines_open = true;
        let mut errors_open = true;

        loop {
            let commands = tokio::select! {
                maybe_line = self.line_rx.recv(), if lines_open => match maybe_line {
                    Some(raw) => {
                        let mut commands = self.ingest(raw);
                        // 큐에 쌓인 라인을 묶어서 처리한다 (라인 순서는 유지)
                        while let Ok(raw) = self.line_rx.try_recv() {
                            commands.extend(self.ingest(raw));
                        }
                        commands
                    }
                    None => {
                        lines_open = false;
                        Vec::new()
                    }
                },
                maybe_err = self.error_rx.recv(), if errors_open => match maybe_err {
                    Some(err) => {
                        tracing::error!(error = %err, "log stream failed; only quit is available");
                        self.session.update(Msg::StreamFailed(err))
                    }
                    None => {
                        errors_open = false;
                        Vec::new()
                    }
                },
                Some((ip, result)) = self.enrich_rx.recv() => {
                    self.session.update(Msg::Enriched { ip, result })
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received");
                    self.session.update(Msg::Intent(UserIntent::Quit))
                }
            };

            for command in commands {
                match command {
                    Command::StartLookup(ip) => self.start_lookup(ip),
                    Command::Quit => {
                        self.tailer_shutdown.cancel();
                        return;
                    }
                }
            }
        }
    }

    /// 라인 하나를 세션에 전달하고, 새로 수집된 이벤트를 출력합니다.
    fn ingest(&mut self, raw: RawLine) -> Vec<Command> {
        let before = self.session.total();
        let commands = self.session.update(Msg::Line(raw));
        if self.session.total() > before
            && let Some(event) = self.session.latest()
        {
            println!("{}", view::follow_line(event));
        }
        commands
    }

    /// whois 조회 워커를 시작합니다.
    fn start_lookup(&mut self, ip: String) {
        if !self.enrich_enabled {
            // 조회가 꺼져 있으면 빈 결과를 즉시 확정한다
            let _ = self.session.update(Msg::Enriched {
                ip,
                result: EnrichmentResult::default(),
            });
            return;
        }
        tracing::debug!(ip, "starting whois lookup");
        let client = self.whois.clone();
        let tx = self.enrich_tx.clone();
        tokio::spawn(async move {
            let result = client.lookup(&ip).await;
            // 루프가 이미 종료되었으면 결과는 조용히 버려진다
            let _ = tx.send((ip, result)).await;
        });
    }
}
