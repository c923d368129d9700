//! 방화벽 로그 라인 파서
//!
//! iptables/ufw 커널 로그 한 줄을 [`LogEvent`]로 변환합니다.
//! 두 가지 비호환 방언을 모두 받아들입니다:
//!
//! - syslog 형식: `Feb  3 10:02:11 router kernel: [DROP] IN=eth1 ...`
//!   (연도 없음 — 파싱 시점의 현재 연도와 로컬 타임존을 적용)
//! - ISO 형식: `2026-02-22T00:00:28.257338+01:00 router kernel: [UFW BLOCK] ...`
//!
//! 구조 패턴은 선언적 정규식 하나로 표현하고, 백엔드마다 위치가 다른
//! `TTL=`/`LEN=`은 라인 전체를 훑는 독립 정규식으로 추출합니다.
//! 파싱 실패는 "이 라인을 건너뛰라"는 신호일 뿐 파이프라인을 중단시키지
//! 않습니다.

use chrono::{DateTime, Datelike, Local, NaiveDateTime, TimeZone};
use regex::Regex;

use fwscope_core::types::LogEvent;

use crate::error::LogStreamError;

pub mod proto;

/// 라인의 핵심 구조에 대한 정규식.
///
/// 그룹: ts, host, prefix, in, out, src, dst, proto, spt?, dpt?
/// 모델링하지 않은 필드(MAC=, WINDOW= 등)는 어디에 있어도 무시됩니다.
const LINE_PATTERN: &str = r"^(?P<ts>\d{4}-\d{2}-\d{2}T\S+|\w{3}\s+\d+\s+[\d:]+)\s+(?P<host>\S+)\s+kernel:.*?\[?(?P<prefix>[^\]]*?)\]?\s+IN=(?P<in>\S*)\s+OUT=(?P<out>\S*).*?SRC=(?P<src>\S+)\s+DST=(?P<dst>\S+).*?PROTO=(?P<proto>\S+)(?:.*?SPT=(?P<spt>\d+))?(?:.*?DPT=(?P<dpt>\d+))?";

/// 방화벽 로그 라인 파서
///
/// 상태가 없는 순수 변환기입니다. 같은 입력은 항상 같은 [`LogEvent`]를
/// 만들고, 어떤 입력에도 패닉하지 않습니다.
pub struct FirewallLogParser {
    /// 라인 구조 정규식
    line_re: Regex,
    /// TTL 추출 정규식 (위치 무관)
    ttl_re: Regex,
    /// LEN 추출 정규식 (위치 무관)
    len_re: Regex,
}

impl FirewallLogParser {
    /// 새 파서를 생성합니다 (정규식 컴파일).
    pub fn new() -> Result<Self, LogStreamError> {
        Ok(Self {
            line_re: Regex::new(LINE_PATTERN)?,
            ttl_re: Regex::new(r"TTL=(\d+)")?,
            len_re: Regex::new(r"\bLEN=(\d+)")?,
        })
    }

    /// 로그 라인 하나를 파싱합니다.
    ///
    /// 필수 토큰(타임스탬프, `SRC=`, `DST=`, `PROTO=`)이 없으면 실패합니다.
    /// `SPT=`/`DPT=`/`TTL=`/`LEN=` 부재는 에러가 아니라 `None`입니다.
    pub fn parse(&self, line: &str) -> Result<LogEvent, LogStreamError> {
        let caps = self
            .line_re
            .captures(line)
            .ok_or_else(|| LogStreamError::Parse {
                reason: "line does not match firewall log format".to_owned(),
            })?;

        let timestamp = parse_timestamp(&caps["ts"])?;

        let src_port = caps.name("spt").and_then(|m| m.as_str().parse().ok());
        let dst_port = caps.name("dpt").and_then(|m| m.as_str().parse().ok());
        let ttl = self
            .ttl_re
            .captures(line)
            .and_then(|c| c[1].parse().ok());
        let length = self
            .len_re
            .captures(line)
            .and_then(|c| c[1].parse().ok());

        Ok(LogEvent {
            timestamp,
            hostname: caps["host"].to_owned(),
            prefix: caps["prefix"]
                .trim_matches(|c| c == '[' || c == ' ')
                .to_owned(),
            in_iface: caps["in"].to_owned(),
            out_iface: caps["out"].to_owned(),
            src: caps["src"].to_owned(),
            dst: caps["dst"].to_owned(),
            proto: proto::normalize(&caps["proto"]),
            src_port,
            dst_port,
            ttl,
            length,
            raw: line.to_owned(),
        })
    }
}

/// 타임스탬프 토큰을 파싱합니다.
///
/// 숫자로 시작하면 ISO 8601(오프셋 포함)로, 아니면 syslog 형식
/// (`Mon D HH:MM:SS`)으로 해석합니다. syslog 형식은 연도가 없으므로
/// 현재 연도를 가정하고 로컬 타임존을 적용합니다.
fn parse_timestamp(value: &str) -> Result<DateTime<Local>, LogStreamError> {
    if value.as_bytes().first().is_some_and(u8::is_ascii_digit) {
        let parsed =
            DateTime::parse_from_rfc3339(value).map_err(|e| LogStreamError::Parse {
                reason: format!("invalid ISO timestamp '{value}': {e}"),
            })?;
        return Ok(parsed.with_timezone(&Local));
    }

    // syslog 형식은 한 자리 날짜 앞에 공백을 두 개 넣으므로 먼저 정규화한다.
    let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let with_year = format!("{} {}", Local::now().year(), normalized);
    let naive = NaiveDateTime::parse_from_str(&with_year, "%Y %b %d %H:%M:%S").map_err(|e| {
        LogStreamError::Parse {
            reason: format!("invalid syslog timestamp '{value}': {e}"),
        }
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| LogStreamError::Parse {
            reason: format!("timestamp '{value}' does not exist in the local timezone"),
        })
}
