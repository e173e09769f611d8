//! Disallowed address ranges shared by the validator and the resolver guard.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;

use ipnet::{Ipv4Net, Ipv6Net};

/// Private, loopback, link-local, shared, documentation, multicast and reserved IPv4 space.
const BLOCKED_IPV4_CIDRS: &[&str] = &[
    "0.0.0.0/8",
    "10.0.0.0/8",
    "100.64.0.0/10",
    "127.0.0.0/8",
    "169.254.0.0/16",
    "172.16.0.0/12",
    "192.0.0.0/24",
    "192.0.2.0/24",
    "192.88.99.0/24",
    "192.168.0.0/16",
    "198.18.0.0/15",
    "198.51.100.0/24",
    "203.0.113.0/24",
    "224.0.0.0/4",
    "240.0.0.0/4",
];

const BLOCKED_IPV6_CIDRS: &[&str] = &[
    "::/128",
    "::1/128",
    "64:ff9b:1::/48",
    "100::/64",
    "2001::/23",
    "2001:db8::/32",
    "fc00::/7",
    "fe80::/10",
    "fec0::/10",
    "ff00::/8",
];

/// Host names that always point inward, whatever DNS says.
const INTERNAL_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "ip6-localhost",
    "ip6-loopback",
    "metadata.google.internal",
    "metadata.internal",
];

fn ipv4_nets() -> &'static [Ipv4Net] {
    static NETS: OnceLock<Vec<Ipv4Net>> = OnceLock::new();
    NETS.get_or_init(|| {
        BLOCKED_IPV4_CIDRS
            .iter()
            .filter_map(|cidr| cidr.parse().ok())
            .collect()
    })
}

fn ipv6_nets() -> &'static [Ipv6Net] {
    static NETS: OnceLock<Vec<Ipv6Net>> = OnceLock::new();
    NETS.get_or_init(|| {
        BLOCKED_IPV6_CIDRS
            .iter()
            .filter_map(|cidr| cidr.parse().ok())
            .collect()
    })
}

/// Whether `ip` must never be contacted.
///
/// IPv6 addresses that embed an IPv4 address (`::ffff:a.b.c.d`, the
/// deprecated `::a.b.c.d` form, NAT64 `64:ff9b::/96` and 6to4 `2002::/16`)
/// are judged by the embedded IPv4 address as well.
pub fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_ipv4(v4),
        IpAddr::V6(v6) => {
            if is_blocked_ipv6(v6) {
                return true;
            }
            match embedded_ipv4(v6) {
                Some(v4) => is_blocked_ipv4(v4),
                None => false,
            }
        }
    }
}

fn is_blocked_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_broadcast() || ipv4_nets().iter().any(|net| net.contains(&ip))
}

fn is_blocked_ipv6(ip: Ipv6Addr) -> bool {
    ipv6_nets().iter().any(|net| net.contains(&ip))
}

fn embedded_ipv4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return Some(mapped);
    }
    let seg = ip.segments();
    // 6to4 carries the IPv4 address in bits 16..48.
    if seg[0] == 0x2002 {
        return Some(Ipv4Addr::new(
            (seg[1] >> 8) as u8,
            seg[1] as u8,
            (seg[2] >> 8) as u8,
            seg[2] as u8,
        ));
    }
    let tail = Ipv4Addr::new(
        (seg[6] >> 8) as u8,
        seg[6] as u8,
        (seg[7] >> 8) as u8,
        seg[7] as u8,
    );
    // NAT64 well-known prefix.
    if seg[..6] == [0x64, 0xff9b, 0, 0, 0, 0] {
        return Some(tail);
    }
    // IPv4-compatible (deprecated) ::a.b.c.d; :: and ::1 are covered by the v6 list.
    if seg[..6] == [0, 0, 0, 0, 0, 0] {
        return Some(tail);
    }
    None
}

/// Whether a (lowercase, trailing-dot-free) domain name is a well-known internal name.
pub fn is_internal_hostname(host: &str) -> bool {
    INTERNAL_HOSTNAMES.contains(&host) || host.ends_with(".localhost")
}
