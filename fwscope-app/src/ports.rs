//! 잘 알려진 포트 → IANA 서비스명
//!
//! 상세 보기와 follow 모드에서 목적지 포트 옆에 서비스명을 보여주기 위한
//! 축약 표입니다. IANA service-names 레지스트리에서 방화벽 로그에 실제로
//! 자주 나타나는 항목만 추렸습니다.

/// 포트/프로토콜 쌍의 IANA 서비스명을 반환합니다.
///
/// 프로토콜은 대소문자를 구분하지 않으며, TCP/UDP 외의 프로토콜은
/// 서비스명이 없습니다.
pub fn service_name(port: u16, proto: &str) -> Option<&'static str> {
    let tcp = proto.eq_ignore_ascii_case("tcp");
    let udp = proto.eq_ignore_ascii_case("udp");
    if !tcp && !udp {
        return None;
    }

    let name = match port {
        20 if tcp => "ftp-data",
        21 if tcp => "ftp",
        22 => "ssh",
        23 if tcp => "telnet",
        25 if tcp => "smtp",
        53 => "domain",
        67 if udp => "bootps",
        68 if udp => "bootpc",
        69 if udp => "tftp",
        80 => "http",
        110 if tcp => "pop3",
        111 => "sunrpc",
        123 if udp => "ntp",
        135 => "epmap",
        137 if udp => "netbios-ns",
        138 if udp => "netbios-dgm",
        139 if tcp => "netbios-ssn",
        143 if tcp => "imap",
        161 if udp => "snmp",
        162 if udp => "snmptrap",
        179 if tcp => "bgp",
        389 => "ldap",
        443 => "https",
        445 => "microsoft-ds",
        465 if tcp => "submissions",
        500 if udp => "isakmp",
        514 if udp => "syslog",
        515 if tcp => "printer",
        520 if udp => "router",
        546 if udp => "dhcpv6-client",
        547 if udp => "dhcpv6-server",
        587 if tcp => "submission",
        631 => "ipp",
        636 => "ldaps",
        853 => "domain-s",
        873 if tcp => "rsync",
        993 if tcp => "imaps",
        995 if tcp => "pop3s",
        1194 => "openvpn",
        1433 if tcp => "ms-sql-s",
        1521 if tcp => "ncube-lm",
        1900 if udp => "ssdp",
        2049 => "nfs",
        2375 if tcp => "docker",
        3128 if tcp => "ndl-aas",
        3306 if tcp => "mysql",
        3389 => "ms-wbt-server",
        4500 if udp => "ipsec-nat-t",
        5060 => "sip",
        5353 if udp => "mdns",
        5432 if tcp => "postgresql",
        5900 if tcp => "vnc-server",
        6379 if tcp => "redis",
        8080 => "http-alt",
        8443 if tcp => "pcsync-https",
        9200 if tcp => "wap-wsp",
        11211 => "memcache",
        27017 if tcp => "mongodb",
        _ => return None,
    };
    Some(name)
}
