//! LineTailer 통합 테스트
//!
//! 실제 파일시스템(tempfile)에 대해 테일러의 핵심 계약을 검증합니다:
//! 추가 라인 수집, 시작 오프셋, 부분 라인 재조립, 로테이션 감지,
//! 종결 에러, 협력적 종료.

use std::io::Write;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;

use fwscope_log_stream::tailer::{LineTailer, RawLine, TailConfig};

/// 테스트용 짧은 폴링 주기
const TEST_POLL_MS: u64 = 20;

/// 수신 대기 상한 — 폴링 몇 회 분량이면 충분하다
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn test_config(path: &std::path::Path, replay_history: bool) -> TailConfig {
    TailConfig {
        path: path.to_path_buf(),
        replay_history,
        poll_interval_ms: TEST_POLL_MS,
        ..Default::default()
    }
}

async fn recv_line(rx: &mut tokio::sync::mpsc::Receiver<RawLine>) -> String {
    let raw = timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a line")
        .expect("line channel closed unexpectedly");
    raw.text().into_owned()
}

#[tokio::test]
async fn replay_history_emits_existing_lines_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "first\nsecond\nthird\n").unwrap();

    let (tailer, mut line_rx, _err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    let token = tailer.cancellation_token();
    tailer.spawn();

    assert_eq!(recv_line(&mut line_rx).await, "first");
    assert_eq!(recv_line(&mut line_rx).await, "second");
    assert_eq!(recv_line(&mut line_rx).await, "third");

    token.cancel();
}

#[tokio::test]
async fn without_history_only_appended_lines_are_emitted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "old line\n").unwrap();

    let (tailer, mut line_rx, _err_rx) = LineTailer::new(test_config(&path, false)).unwrap();
    let token = tailer.cancellation_token();
    tailer.spawn();

    // 테일러가 EOF에 도달할 시간을 준 뒤 새 라인을 추가한다
    tokio::time::sleep(Duration::from_millis(TEST_POLL_MS * 5)).await;
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "new line").unwrap();
    file.flush().unwrap();

    assert_eq!(recv_line(&mut line_rx).await, "new line");
    token.cancel();
}

#[tokio::test]
async fn partial_line_is_emitted_once_when_completed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "complete\n").unwrap();

    let (tailer, mut line_rx, _err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    let token = tailer.cancellation_token();
    tailer.spawn();

    assert_eq!(recv_line(&mut line_rx).await, "complete");

    // 개행 없는 앞부분만 기록
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    write!(file, "partial-").unwrap();
    file.flush().unwrap();

    // 폴링을 몇 번 돌아도 부분 라인은 나오지 않아야 한다
    tokio::time::sleep(Duration::from_millis(TEST_POLL_MS * 5)).await;
    assert!(line_rx.try_recv().is_err());

    // 나머지를 채우면 온전한 라인 하나로 나온다
    writeln!(file, "now-complete").unwrap();
    file.flush().unwrap();

    assert_eq!(recv_line(&mut line_rx).await, "partial-now-complete");
    token.cancel();
}

#[tokio::test]
async fn rotation_reopens_from_start_without_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "line-one\nline-two\n").unwrap();

    let (tailer, mut line_rx, mut err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    let token = tailer.cancellation_token();
    tailer.spawn();

    assert_eq!(recv_line(&mut line_rx).await, "line-one");
    assert_eq!(recv_line(&mut line_rx).await, "line-two");

    // 파일 크기를 마지막 읽기 오프셋보다 작게 만들어 로테이션을 흉내낸다
    std::fs::write(&path, "fresh\n").unwrap();

    assert_eq!(recv_line(&mut line_rx).await, "fresh");
    // 로테이션은 에러가 아니다
    assert!(err_rx.try_recv().is_err());
    token.cancel();
}

#[tokio::test]
async fn missing_file_is_a_terminal_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.log");

    let (tailer, mut line_rx, mut err_rx) = LineTailer::new(test_config(&path, false)).unwrap();
    let handle = tailer.spawn();

    let err = timeout(RECV_TIMEOUT, err_rx.recv())
        .await
        .expect("timed out waiting for the terminal error")
        .expect("error channel closed without an error");
    assert!(err.to_string().contains("open error"));

    // 에러 이후 태스크는 종료되고 라인 채널은 닫힌다
    handle.await.unwrap();
    assert!(timeout(RECV_TIMEOUT, line_rx.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn file_disappearing_mid_stream_is_terminal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "one\n").unwrap();

    let (tailer, mut line_rx, mut err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    tailer.spawn();

    assert_eq!(recv_line(&mut line_rx).await, "one");

    std::fs::remove_file(&path).unwrap();

    let err = timeout(RECV_TIMEOUT, err_rx.recv())
        .await
        .expect("timed out waiting for the terminal error")
        .expect("error channel closed without an error");
    assert!(err.to_string().contains("watch error"));
}

#[tokio::test]
async fn cancellation_stops_the_task() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "").unwrap();

    let (tailer, _line_rx, _err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    let token = tailer.cancellation_token();
    let handle = tailer.spawn();

    token.cancel();
    timeout(RECV_TIMEOUT, handle)
        .await
        .expect("tailer did not stop after cancellation")
        .unwrap();
}

#[tokio::test]
async fn empty_lines_are_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "first\n\n\nsecond\n").unwrap();

    let (tailer, mut line_rx, _err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    let token = tailer.cancellation_token();
    tailer.spawn();

    assert_eq!(recv_line(&mut line_rx).await, "first");
    assert_eq!(recv_line(&mut line_rx).await, "second");
    token.cancel();
}

#[tokio::test]
async fn crlf_terminators_are_stripped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("fw.log");
    std::fs::write(&path, "windows line\r\n").unwrap();

    let (tailer, mut line_rx, _err_rx) = LineTailer::new(test_config(&path, true)).unwrap();
    let token = tailer.cancellation_token();
    tailer.spawn();

    assert_eq!(recv_line(&mut line_rx).await, "windows line");
    token.cancel();
}
