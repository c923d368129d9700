//! 도메인 타입 — 파이프라인 전역에서 사용되는 공통 타입
//!
//! 모든 크레이트가 공유하는 데이터 구조를 정의합니다.
//! [`LogEvent`]는 파서가 생성한 뒤 세션이 단독 소유하며,
//! 권위 컬렉션에 추가된 이후에는 절대 변경되지 않습니다.
//! 필터링과 분류는 항상 파생 뷰이며 원본 레코드를 수정하지 않습니다.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 파싱된 방화벽 로그 이벤트
///
/// iptables/ufw 커널 로그 한 줄에서 추출한 구조화 레코드입니다.
/// `SPT=`/`DPT=`/`TTL=`/`LEN=`은 로깅 백엔드에 따라 없을 수 있으므로
/// `Option`으로 표현합니다. 원본 라인은 상세 보기용으로 보존됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// 타임스탬프 (로컬 타임존)
    pub timestamp: DateTime<Local>,
    /// 호스트명
    pub hostname: String,
    /// 판정 prefix (예: "UFW BLOCK", "DROP", 커스텀 체인명)
    pub prefix: String,
    /// 수신 인터페이스 (`IN=`, 빈 값 가능)
    pub in_iface: String,
    /// 송신 인터페이스 (`OUT=`, 빈 값 가능)
    pub out_iface: String,
    /// 출발지 IP
    pub src: String,
    /// 목적지 IP
    pub dst: String,
    /// 전송 프로토콜 (정규화된 대문자 이름)
    pub proto: String,
    /// 출발지 포트 (`SPT=`)
    pub src_port: Option<u16>,
    /// 목적지 포트 (`DPT=`)
    pub dst_port: Option<u16>,
    /// TTL
    pub ttl: Option<u32>,
    /// 패킷 길이 (`LEN=`, 바이트)
    pub length: Option<u32>,
    /// 원본 라인 (상세 보기/디버깅용)
    pub raw: String,
}

impl LogEvent {
    /// prefix에서 파생된 방화벽 판정을 반환합니다.
    ///
    /// 저장되지 않고 매번 계산됩니다. prefix가 바뀌지 않는 한 결과도
    /// 바뀌지 않습니다.
    pub fn action(&self) -> Action {
        Action::from_prefix(&self.prefix)
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp : {}", self.timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Hostname  : {}", self.hostname)?;
        writeln!(f, "Prefix    : {}", self.prefix)?;
        writeln!(f, "Action    : {}", self.action())?;
        writeln!(f, "In        : {}", self.in_iface)?;
        writeln!(f, "Out       : {}", self.out_iface)?;
        writeln!(f, "Src       : {}", self.src)?;
        writeln!(f, "Dst       : {}", self.dst)?;
        writeln!(f, "Proto     : {}", self.proto)?;
        if let Some(spt) = self.src_port {
            writeln!(f, "SrcPort   : {spt}")?;
        }
        if let Some(dpt) = self.dst_port {
            writeln!(f, "DstPort   : {dpt}")?;
        }
        if let Some(ttl) = self.ttl {
            writeln!(f, "TTL       : {ttl}")?;
        }
        if let Some(len) = self.length {
            writeln!(f, "Len       : {len}")?;
        }
        write!(f, "\nRaw:\n{}", self.raw)
    }
}

/// 방화벽 판정 (prefix에서 파생)
///
/// DROP/BLOCK을 ACCEPT보다, ACCEPT를 REJECT보다 먼저 검사합니다.
/// 어느 것에도 해당하지 않는 비어 있지 않은 prefix는 원문 그대로
/// [`Action::Other`]로 전달되고, 빈 prefix는 [`Action::Unknown`]이 됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// 차단 (DROP 또는 BLOCK prefix)
    Drop,
    /// 허용
    Accept,
    /// 거부
    Reject,
    /// 매칭되지 않은 prefix 원문
    Other(String),
    /// 빈 prefix
    Unknown,
}

impl Action {
    /// prefix 텍스트에서 판정을 파생합니다.
    ///
    /// 대소문자를 구분하지 않는 부분 문자열 매칭입니다.
    pub fn from_prefix(prefix: &str) -> Self {
        let upper = prefix.to_uppercase();
        if upper.contains("DROP") || upper.contains("BLOCK") {
            Self::Drop
        } else if upper.contains("ACCEPT") {
            Self::Accept
        } else if upper.contains("REJECT") {
            Self::Reject
        } else if !prefix.is_empty() {
            Self::Other(prefix.to_owned())
        } else {
            Self::Unknown
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Drop => write!(f, "DROP"),
            Self::Accept => write!(f, "ACCEPT"),
            Self::Reject => write!(f, "REJECT"),
            Self::Other(prefix) => write!(f, "{prefix}"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// IP 주소 분류
///
/// 분류 우선순위는 Multicast > Internal > External이며,
/// 파싱할 수 없는 입력은 가장 신뢰도가 낮은 External로 분류됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// 시작 시점 스냅샷의 로컬 서브넷에 속하는 주소
    Internal,
    /// 멀티캐스트 대역 (224.0.0.0/4, ff00::/8)
    Multicast,
    /// 그 외 전부
    External,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal => write!(f, "Internal"),
            Self::Multicast => write!(f, "Multicast"),
            Self::External => write!(f, "External"),
        }
    }
}

/// 활성 필터 상태
///
/// 필터 뷰는 언제나 권위 컬렉션에서 도착 순서대로 재파생 가능한
/// 부분 수열이며, 그 자체가 진실의 원천이 되지 않습니다.
/// 세 필터는 논리 AND로 결합됩니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    /// 판정 필터 (None이면 제약 없음)
    pub action: Option<Action>,
    /// 프로토콜 필터 (None이면 제약 없음)
    pub proto: Option<String>,
    /// IP 부분 문자열 필터 (빈 문자열이면 제약 없음)
    pub ip_substr: String,
}

impl FilterState {
    /// 이벤트가 모든 활성 필터를 만족하는지 검사합니다.
    pub fn matches(&self, event: &LogEvent) -> bool {
        if let Some(action) = &self.action
            && event.action() != *action
        {
            return false;
        }
        if let Some(proto) = &self.proto
            && event.proto != *proto
        {
            return false;
        }
        if !self.ip_substr.is_empty() {
            let needle = self.ip_substr.to_lowercase();
            if !event.src.to_lowercase().contains(&needle)
                && !event.dst.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// 판정 필터를 토글합니다.
    ///
    /// 같은 값을 두 번 누르면 해제되고, 다른 값을 누르면 교체됩니다.
    pub fn toggle_action(&mut self, action: Action) {
        if self.action.as_ref() == Some(&action) {
            self.action = None;
        } else {
            self.action = Some(action);
        }
    }

    /// 프로토콜 필터를 토글합니다.
    pub fn toggle_proto(&mut self, proto: &str) {
        if self.proto.as_deref() == Some(proto) {
            self.proto = None;
        } else {
            self.proto = Some(proto.to_owned());
        }
    }

    /// 어떤 필터도 활성화되어 있지 않은지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.proto.is_none() && self.ip_substr.is_empty()
    }
}

/// 누적 카운터
///
/// 필터와 무관하게 *전체* 스트림을 대상으로 하며, 모든 버킷은
/// 단조 증가합니다. 필터 변경이 과거 카운터를 왜곡해서는 안 됩니다.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    /// 수집된 총 이벤트 수
    pub total: u64,
    /// 판정별 카운터
    pub by_action: HashMap<String, u64>,
    /// 프로토콜별 카운터
    pub by_proto: HashMap<String, u64>,
    /// 인터페이스별 카운터 (IN/OUT 각각, 빈 이름 제외)
    pub by_iface: HashMap<String, u64>,
    /// 출발지 IP별 카운터
    pub by_src_ip: HashMap<String, u64>,
    /// 목적지 포트별 카운터
    pub by_dst_port: HashMap<u16, u64>,
}

impl RunningStats {
    /// 새 이벤트를 모든 버킷에 무조건 반영합니다.
    pub fn observe(&mut self, event: &LogEvent) {
        self.total += 1;
        *self
            .by_action
            .entry(event.action().to_string())
            .or_default() += 1;
        *self.by_proto.entry(event.proto.clone()).or_default() += 1;
        if !event.in_iface.is_empty() {
            *self.by_iface.entry(event.in_iface.clone()).or_default() += 1;
        }
        if !event.out_iface.is_empty() {
            *self.by_iface.entry(event.out_iface.clone()).or_default() += 1;
        }
        *self.by_src_ip.entry(event.src.clone()).or_default() += 1;
        if let Some(dpt) = event.dst_port {
            *self.by_dst_port.entry(dpt).or_default() += 1;
        }
    }

    /// 출발지 IP 상위 `n`개를 (IP, 횟수)로 반환합니다.
    ///
    /// 횟수 내림차순, 같으면 키 오름차순입니다.
    pub fn top_src_ips(&self, n: usize) -> Vec<(String, u64)> {
        let mut items: Vec<(String, u64)> = self
            .by_src_ip
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items.truncate(n);
        items
    }

    /// 목적지 포트 상위 `n`개를 (포트, 횟수)로 반환합니다.
    pub fn top_dst_ports(&self, n: usize) -> Vec<(u16, u64)> {
        let mut items: Vec<(u16, u64)> = self.by_dst_port.iter().map(|(k, v)| (*k, *v)).collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items.truncate(n);
        items
    }
}

/// whois 조회 결과
///
/// 네 필드가 전부 비어 있는 값도 유효한 "찾은 정보 없음" 결과이며,
/// "아직 조회하지 않음"이나 "조회 진행 중"과는 구분됩니다.
/// 한 키에 대해 캐시된 결과는 프로세스 수명 동안 유지됩니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// 서브넷 범위 (inetnum / NetRange / CIDR)
    pub subnet: Option<String>,
    /// 등록된 네트워크 이름 (netname / NetName)
    pub net_name: Option<String>,
    /// AS 번호 (aut-num / OriginAS)
    pub asn: Option<String>,
    /// 조직명 (org-name / OrgName / Organization / org)
    pub org: Option<String>,
}

impl EnrichmentResult {
    /// 추출된 필드가 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.subnet.is_none() && self.net_name.is_none() && self.asn.is_none() && self.org.is_none()
    }
}

/// 조회 키 하나의 캐시 상태
///
/// 캐시 맵에 키가 아예 없는 상태가 "아직 조회하지 않음"이며,
/// 소비자는 세 상태를 모두 구분할 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentStatus {
    /// 조회가 시작되어 결과를 기다리는 중
    Pending,
    /// 조회 완료 (빈 결과 포함, 재시도 없음)
    Resolved(EnrichmentResult),
}
