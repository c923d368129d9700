//! IP 주소 분류기
//!
//! 주소를 Internal / Multicast / External로 분류합니다. 로컬 서브넷
//! 목록은 프로세스 시작 시 네트워크 인터페이스를 한 번 열거하여
//! 스냅샷하며, 이후 인터페이스가 바뀌어도 다시 감지하지 않습니다
//! (문서화된 제한 사항이며 결함이 아닙니다).
//!
//! 분류 우선순위는 Multicast > Internal > External이고, 파싱할 수 없는
//! 입력은 가장 신뢰도가 낮은 External로 분류합니다 — Internal 쪽으로
//! 열리는 일은 없습니다.

use std::net::IpAddr;
use std::str::FromStr;

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

use fwscope_core::types::Category;

/// IP 주소 분류기
///
/// 시작 시점 인터페이스 스냅샷 이후에는 순수 함수처럼 동작합니다.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    /// 로컬 서브넷 prefix 스냅샷 (불변)
    subnets: Vec<IpNet>,
}

impl Classifier {
    /// 현재 네트워크 인터페이스를 열거하여 분류기를 생성합니다.
    ///
    /// 열거에 실패하면 빈 스냅샷으로 동작합니다 — 멀티캐스트가 아닌
    /// 모든 주소가 External로 분류됩니다.
    pub fn from_interfaces() -> Self {
        let mut subnets = Vec::new();
        match nix::ifaddrs::getifaddrs() {
            Ok(addrs) => {
                for ifaddr in addrs {
                    if let Some(net) = interface_subnet(&ifaddr) {
                        subnets.push(net);
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "interface enumeration failed, classifying everything as external");
            }
        }
        Self { subnets }
    }

    /// 주어진 서브넷 목록으로 분류기를 생성합니다 (테스트/임베딩용).
    pub fn with_subnets(subnets: Vec<IpNet>) -> Self {
        Self { subnets }
    }

    /// 스냅샷에 포함된 서브넷 수를 반환합니다.
    pub fn subnet_count(&self) -> usize {
        self.subnets.len()
    }

    /// IP 주소 문자열을 분류합니다.
    pub fn categorize(&self, ip_str: &str) -> Category {
        let Ok(ip) = IpAddr::from_str(ip_str) else {
            return Category::External;
        };
        if ip.is_multicast() {
            return Category::Multicast;
        }
        if self.subnets.iter().any(|net| net.contains(&ip)) {
            return Category::Internal;
        }
        Category::External
    }
}

/// 인터페이스 주소/넷마스크 쌍에서 서브넷 prefix를 계산합니다.
fn interface_subnet(ifaddr: &nix::ifaddrs::InterfaceAddress) -> Option<IpNet> {
    let address = ifaddr.address.as_ref()?;
    let netmask = ifaddr.netmask.as_ref()?;

    if let (Some(addr), Some(mask)) = (address.as_sockaddr_in(), netmask.as_sockaddr_in()) {
        let prefix = u32::from(mask.ip()).count_ones() as u8;
        return Ipv4Net::new(addr.ip(), prefix).ok().map(IpNet::V4);
    }
    if let (Some(addr), Some(mask)) = (address.as_sockaddr_in6(), netmask.as_sockaddr_in6()) {
        let prefix = u128::from(mask.ip()).count_ones() as u8;
        return Ipv6Net::new(addr.ip(), prefix).ok().map(IpNet::V6);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier_with(nets: &[&str]) -> Classifier {
        let subnets = nets
            .iter()
            .map(|n| n.parse::<IpNet>().unwrap())
            .collect();
        Classifier::with_subnets(subnets)
    }

    #[test]
    fn external_address_with_internal_snapshot() {
        // 스냅샷에 192.168.0.0/16만 있을 때 5.6.7.8은 External
        let classifier = classifier_with(&["192.168.0.0/16"]);
        assert_eq!(classifier.categorize("5.6.7.8"), Category::External);
    }

    #[test]
    fn address_inside_snapshot_is_internal() {
        let classifier = classifier_with(&["192.168.0.0/16", "10.0.0.0/8"]);
        assert_eq!(classifier.categorize("192.168.1.1"), Category::Internal);
        assert_eq!(classifier.categorize("10.20.30.40"), Category::Internal);
    }

    #[test]
    fn multicast_takes_precedence_over_internal() {
        // 스냅샷이 멀티캐스트 대역을 덮더라도 Multicast가 우선
        let classifier = classifier_with(&["224.0.0.0/4"]);
        assert_eq!(classifier.categorize("224.0.0.251"), Category::Multicast);
    }

    #[test]
    fn ipv6_multicast_is_recognized() {
        let classifier = classifier_with(&[]);
        assert_eq!(classifier.categorize("ff02::fb"), Category::Multicast);
    }

    #[test]
    fn ipv6_subnet_containment() {
        let classifier = classifier_with(&["fd00::/8"]);
        assert_eq!(classifier.categorize("fd12:3456::1"), Category::Internal);
        assert_eq!(classifier.categorize("2001:db8::1"), Category::External);
    }

    #[test]
    fn unparseable_input_fails_open_to_external() {
        let classifier = classifier_with(&["192.168.0.0/16"]);
        assert_eq!(classifier.categorize("not-an-ip"), Category::External);
        assert_eq!(classifier.categorize(""), Category::External);
    }

    #[test]
    fn empty_snapshot_classifies_everything_external() {
        let classifier = Classifier::with_subnets(Vec::new());
        assert_eq!(classifier.subnet_count(), 0);
        assert_eq!(classifier.categorize("192.168.1.1"), Category::External);
    }

    #[test]
    fn host_bits_in_snapshot_prefix_are_tolerated() {
        // 인터페이스 스냅샷은 호스트 주소 + prefix 형태로 들어온다
        let net = Ipv4Net::new("192.168.1.37".parse().unwrap(), 24).unwrap();
        let classifier = Classifier::with_subnets(vec![IpNet::V4(net)]);
        assert_eq!(classifier.categorize("192.168.1.1"), Category::Internal);
    }

    #[test]
    fn from_interfaces_does_not_fail() {
        // 환경에 따라 결과는 다르지만 스냅샷 생성 자체는 항상 성공해야 한다
        let classifier = Classifier::from_interfaces();
        let _ = classifier.subnet_count();
        // 루프백이 스냅샷에 있으면 127.0.0.1은 Internal이어야 한다
        if classifier.categorize("127.0.0.1") == Category::Internal {
            assert!(classifier.subnet_count() > 0);
        }
    }
}
