//! 외부 whois 조회
//!
//! 대상 IP를 유일한 인자로 외부 whois 도구를 실행하고, 표준출력의
//! 멀티라인 응답에서 알려진 필드를 추출합니다. 도구 부재, 0이 아닌
//! 종료 코드, 타임아웃 초과는 전부 동일하게 "정보 없음"으로 취급됩니다
//! — 호출자에게 에러가 전파되는 일은 없습니다.
//!
//! 응답 파싱은 라인 단위이며 RIPE / ARIN / APNIC / LACNIC / AFRINIC
//! 형식 차이를 필드별 레이블 별칭 목록으로 흡수합니다.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use fwscope_core::types::EnrichmentResult;

use crate::config::EnrichConfig;
use crate::error::EnrichmentError;

/// 서브넷 범위 필드 별칭
const SUBNET_KEYS: &[&str] = &["inetnum", "NetRange", "CIDR"];
/// 네트워크 이름 필드 별칭
const NET_NAME_KEYS: &[&str] = &["netname", "NetName"];
/// AS 번호 필드 별칭
const ASN_KEYS: &[&str] = &["aut-num", "OriginAS"];
/// 조직명 필드 별칭
const ORG_KEYS: &[&str] = &["org-name", "OrgName", "Organization", "org"];

/// whois 서브프로세스 클라이언트
///
/// 조회당 하나의 단명 프로세스를 하드 타임아웃과 함께 실행합니다.
/// 타임아웃이 유일한 취소 경로이며, 실행 중 외부에서 중단할 수 없습니다.
#[derive(Debug, Clone)]
pub struct WhoisClient {
    /// 실행할 명령
    command: String,
    /// 하드 타임아웃
    timeout: Duration,
}

impl WhoisClient {
    /// 설정에서 클라이언트를 생성합니다.
    pub fn new(config: &EnrichConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: config.timeout(),
        }
    }

    /// IP 하나를 조회합니다.
    ///
    /// 어떤 실패 경로든 빈 [`EnrichmentResult`]를 반환하며, 호출자는
    /// 이를 "정보 없음"으로 캐시합니다.
    pub async fn lookup(&self, ip: &str) -> EnrichmentResult {
        match self.query(ip).await {
            Ok(output) => parse_response(&output),
            Err(e) => {
                tracing::debug!(ip, error = %e, "whois lookup yielded no information");
                EnrichmentResult::default()
            }
        }
    }

    /// 외부 명령을 실행하고 표준출력을 반환합니다.
    async fn query(&self, ip: &str) -> Result<String, EnrichmentError> {
        let child = Command::new(&self.command)
            .arg(ip)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| EnrichmentError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| EnrichmentError::Exec {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(EnrichmentError::NonZeroExit {
                command: self.command.clone(),
                status: output.status.to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// whois 응답에서 알려진 필드를 추출합니다.
pub fn parse_response(output: &str) -> EnrichmentResult {
    let lines: Vec<&str> = output.lines().collect();
    EnrichmentResult {
        subnet: first_field(&lines, SUBNET_KEYS),
        net_name: first_field(&lines, NET_NAME_KEYS),
        asn: first_field(&lines, ASN_KEYS),
        org: first_field(&lines, ORG_KEYS),
    }
}

/// 키 목록 중 하나와 (대소문자 무시) 일치하는 첫 라인의 값을 반환합니다.
///
/// 값이 비어 있거나 주석(`#`)으로 시작하면 건너뜁니다.
fn first_field(lines: &[&str], keys: &[&str]) -> Option<String> {
    for line in lines {
        let lower = line.to_lowercase();
        for key in keys {
            let prefix = format!("{}:", key.to_lowercase());
            if lower.starts_with(&prefix) {
                let value = line[key.len() + 1..].trim();
                if !value.is_empty() && !value.starts_with('#') {
                    return Some(value.to_owned());
                }
            }
        }
    }
    None
}
