//! 파일 테일러 — 로그 파일에 추가되는 라인을 증분 읽기로 수집합니다.
//!
//! `tail -f`와 유사한 동작을 폴링 방식으로 구현합니다. 커널별 파일 변경
//! 알림 API 대신 고정 주기(기본 250ms)로 파일 크기를 확인하므로 어느 OS에서든
//! 동일하게 동작하며, 최악의 경우 종단 지연이 폴링 주기로 제한됩니다.
//!
//! # 로테이션 감지
//! 폴링 시점에 파일 크기가 마지막 읽기 오프셋보다 작으면 truncate되었거나
//! 교체된 것으로 보고, 에러 없이 파일을 처음부터 다시 엽니다.
//!
//! # 부분 라인
//! 아직 개행으로 끝나지 않은 라인은 내보내지 않습니다. 소비한 바이트를
//! 버리고 마지막 완전한 라인 뒤의 오프셋으로 되감았다가, 라인이 완성된 뒤
//! 정확히 한 번만 내보냅니다.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use fwscope_core::config::TailSettings;

use crate::error::LogStreamError;

/// 테일러 설정
#[derive(Debug, Clone)]
pub struct TailConfig {
    /// 감시할 파일 경로
    pub path: PathBuf,
    /// true이면 파일 전체를 처음부터 읽음, false이면 시작 시점 이후
    /// 추가된 라인만 내보냄
    pub replay_history: bool,
    /// 파일 상태 체크 주기 (밀리초)
    pub poll_interval_ms: u64,
    /// 라인 채널 용량
    pub line_channel_capacity: usize,
    /// 에러 채널 용량
    pub error_channel_capacity: usize,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/log/iptables.log"),
            replay_history: false,
            poll_interval_ms: 250,
            line_channel_capacity: 256,
            error_channel_capacity: 8,
        }
    }
}

impl TailConfig {
    /// core의 `TailSettings`에서 테일러 설정을 생성합니다.
    pub fn from_core(settings: &TailSettings) -> Self {
        Self {
            path: PathBuf::from(&settings.file),
            replay_history: settings.history,
            poll_interval_ms: settings.poll_interval_ms,
            line_channel_capacity: settings.line_channel_capacity,
            error_channel_capacity: settings.error_channel_capacity,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogStreamError> {
        if self.path.as_os_str().is_empty() {
            return Err(LogStreamError::Config {
                field: "path".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(LogStreamError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.line_channel_capacity == 0 || self.error_channel_capacity == 0 {
            return Err(LogStreamError::Config {
                field: "channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

/// 수집된 원시 로그 라인
///
/// 테일러가 생성하고 파서가 소비하는 중간 데이터 형식입니다.
/// 개행 문자는 이미 제거되어 있습니다.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// 원시 라인 바이트 (개행 제외)
    pub data: Bytes,
    /// 수집 시각
    pub received_at: SystemTime,
}

impl RawLine {
    /// 새 RawLine을 생성합니다.
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            received_at: SystemTime::now(),
        }
    }

    /// 라인을 텍스트로 반환합니다 (유효하지 않은 UTF-8은 대체 문자로).
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

/// 폴링 기반 파일 테일러
///
/// 파일 핸들과 읽기 오프셋을 단독 소유하는 백그라운드 태스크로 실행되며,
/// 완전한 라인만 바운드 채널로 내보냅니다. 종결 에러(열기 실패, 읽기 실패,
/// 파일 소실)는 에러 채널로 한 번 보고된 뒤 태스크가 종료되고, 이후 라인은
/// 더 이상 나오지 않습니다. 로테이션은 에러가 아니며 투명하게 처리됩니다.
pub struct LineTailer {
    /// 테일러 설정
    config: TailConfig,
    /// 수집된 라인 전송 채널
    line_tx: mpsc::Sender<RawLine>,
    /// 종결 에러 전송 채널
    error_tx: mpsc::Sender<LogStreamError>,
    /// 협력적 종료 신호
    shutdown: CancellationToken,
}

impl LineTailer {
    /// 새 테일러와 수신 채널 쌍을 생성합니다.
    ///
    /// 태스크는 아직 시작되지 않습니다. [`LineTailer::spawn`]을 호출하세요.
    pub fn new(
        config: TailConfig,
    ) -> Result<(Self, mpsc::Receiver<RawLine>, mpsc::Receiver<LogStreamError>), LogStreamError>
    {
        config.validate()?;
        let (line_tx, line_rx) = mpsc::channel(config.line_channel_capacity);
        let (error_tx, error_rx) = mpsc::channel(config.error_channel_capacity);
        let tailer = Self {
            config,
            line_tx,
            error_tx,
            shutdown: CancellationToken::new(),
        };
        Ok((tailer, line_rx, error_rx))
    }

    /// 종료 토큰의 복제본을 반환합니다.
    ///
    /// 토큰을 cancel하면 테일러는 다음 읽기/폴링 경계에서 종료됩니다.
    /// 종료 시점에 버퍼에 남아 있던 미전송 라인은 유실될 수 있습니다.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 테일러 태스크를 시작합니다.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let path = self.config.path.clone();
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        let (file, mut offset) = match open_at(&path, self.config.replay_history).await {
            Ok(opened) => opened,
            Err(err) => {
                self.report(err);
                return;
            }
        };
        let mut reader = BufReader::new(file);
        let mut buf: Vec<u8> = Vec::with_capacity(4096);

        tracing::debug!(path = %path.display(), offset, "tailer started");

        loop {
            // 현재까지 기록된 완전한 라인을 모두 내보낸다.
            loop {
                buf.clear();
                let read = match reader.read_until(b'\n', &mut buf).await {
                    Ok(n) => n,
                    Err(e) => {
                        self.report(LogStreamError::Read {
                            path: path.display().to_string(),
                            reason: e.to_string(),
                        });
                        return;
                    }
                };
                if read == 0 {
                    break; // EOF
                }
                if !buf.ends_with(b"\n") {
                    // 부분 라인: 마지막 완전한 라인 뒤로 되감고 다음 폴링에서
                    // 다시 읽는다. 완성된 라인은 한 번만 파싱된다.
                    if let Err(e) = reader.seek(SeekFrom::Start(offset)).await {
                        self.report(LogStreamError::Read {
                            path: path.display().to_string(),
                            reason: e.to_string(),
                        });
                        return;
                    }
                    break;
                }
                offset += read as u64;

                let mut end = buf.len();
                while end > 0 && (buf[end - 1] == b'\n' || buf[end - 1] == b'\r') {
                    end -= 1;
                }
                if end == 0 {
                    continue; // 빈 라인
                }

                let raw = RawLine::new(Bytes::copy_from_slice(&buf[..end]));
                tokio::select! {
                    _ = self.shutdown.cancelled() => return,
                    sent = self.line_tx.send(raw) => {
                        if sent.is_err() {
                            // 수신측이 사라졌으면 더 읽을 이유가 없다
                            return;
                        }
                    }
                }
            }

            // 다음 폴링까지 대기 (협력적 종료 지점)
            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = tokio::time::sleep(poll_interval) => {}
            }

            // 로테이션 감지: 파일이 마지막 읽기 오프셋보다 작아졌으면
            // truncate되었거나 교체된 것이므로 처음부터 다시 연다.
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.len() < offset => {
                    tracing::debug!(
                        path = %path.display(),
                        size = meta.len(),
                        offset,
                        "rotation detected, reopening from start"
                    );
                    match open_at(&path, true).await {
                        Ok((file, new_offset)) => {
                            reader = BufReader::new(file);
                            offset = new_offset;
                        }
                        Err(err) => {
                            self.report(err);
                            return;
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    self.report(LogStreamError::Watch {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    });
                    return;
                }
            }
        }
    }

    /// 종결 에러를 보고합니다.
    ///
    /// 에러 채널이 가득 차 있어도 테일러 종료를 막지 않습니다.
    fn report(&self, err: LogStreamError) {
        tracing::error!(error = %err, "tailer terminated");
        let _ = self.error_tx.try_send(err);
    }
}

/// 파일을 열고 시작 오프셋으로 이동합니다.
///
/// `from_start`가 true이면 처음부터, 아니면 현재 파일 끝부터 읽습니다.
async fn open_at(path: &Path, from_start: bool) -> Result<(File, u64), LogStreamError> {
    let mut file = File::open(path).await.map_err(|e| LogStreamError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let offset = if from_start {
        0
    } else {
        file.seek(SeekFrom::End(0))
            .await
            .map_err(|e| LogStreamError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
    };
    Ok((file, offset))
}
