//! Plain-text rendering of listings and ASN summaries, with optional
//! demo-mode censoring.

use std::fmt::Write as _;
use std::net::IpAddr;

use crate::types::AsnSummary;

pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));
const TITLE: &str = "OWASP OAM Tool Suite ";
const SITE: &str = "https://github.com/owasp-amass/oam-tools";
const WIDTH: usize = 80;

// ── Censoring ────────────────────────────────────────────────────

/// Replace characters in `[start, end)` (char positions) with `x`, keeping
/// separators readable. `:` is kept as well so IPv6 addresses keep their shape.
fn censor_range(input: &str, start: usize, end: usize) -> String {
    input
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i >= start && i < end && !matches!(c, '.' | '/' | '-' | ' ' | ':') {
                'x'
            } else {
                c
            }
        })
        .collect()
}

fn char_position(input: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    input.chars().position(pred)
}

fn last_char_position(input: &str, pred: impl Fn(char) -> bool) -> Option<usize> {
    input
        .chars()
        .enumerate()
        .filter(|(_, c)| pred(*c))
        .map(|(i, _)| i)
        .last()
}

/// Censor everything from the first dot on. The leftmost label stays readable.
pub fn censor_domain(name: &str) -> String {
    match char_position(name, |c| c == '.') {
        Some(start) => censor_range(name, start, usize::MAX),
        None => name.to_string(),
    }
}

/// Censor all but the last group of an address.
pub fn censor_ip(ip: &str) -> String {
    let sep = if ip.contains('.') { '.' } else { ':' };
    match last_char_position(ip, |c| c == sep) {
        Some(end) => censor_range(ip, 0, end),
        None => ip.to_string(),
    }
}

/// Censor the address part of a CIDR, keeping the prefix length.
pub fn censor_netblock(cidr: &str) -> String {
    let end = char_position(cidr, |c| c == '/').unwrap_or(usize::MAX);
    censor_range(cidr, 0, end)
}

pub fn censor_all(input: &str) -> String {
    censor_range(input, 0, usize::MAX)
}

// ── Rendering ────────────────────────────────────────────────────

/// A name and its comma-joined addresses, censored in demo mode.
pub fn output_line_parts(name: &str, addresses: &[IpAddr], demo: bool) -> (String, String) {
    let ips = addresses
        .iter()
        .map(|ip| {
            let s = ip.to_string();
            if demo {
                censor_ip(&s)
            } else {
                s
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    let name = if demo {
        censor_domain(name)
    } else {
        name.to_string()
    };
    (name, ips)
}

/// `"<name> <ip>,<ip>"`, or just the name when it has no addresses.
pub fn output_line(name: &str, addresses: &[IpAddr], demo: bool) -> String {
    let (name, ips) = output_line_parts(name, addresses, demo);
    if ips.is_empty() {
        name
    } else {
        format!("{name} {ips}")
    }
}

/// The enumeration summary block: header, name count, and per-ASN netblocks.
///
/// In demo mode ASN numbers and RIR names are censored unless the ASN is 0;
/// netblock addresses are always censored.
pub fn render_summary(total: usize, summary: &AsnSummary, demo: bool) -> String {
    let rule = "-".repeat(WIDTH);
    let pad = WIDTH.saturating_sub(TITLE.len() + VERSION.len() + SITE.len());

    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "{TITLE}{VERSION}{}{SITE}", " ".repeat(pad));
    let _ = write!(out, "{rule}");
    let _ = writeln!(out, "\n{total} names discovered");

    if summary.is_empty() {
        return out;
    }
    let _ = writeln!(out, "{rule}");

    for (asn, info) in summary {
        let mut asn_str = asn.to_string();
        let mut rir = info.rir_name.clone();
        if demo && *asn > 0 {
            asn_str = censor_all(&asn_str);
            rir = censor_all(&rir);
        }
        let _ = writeln!(out, "ASN: {asn_str} - {rir}");

        for (cidr, count) in &info.cidrs {
            let mut cidr_str = cidr.to_string();
            if demo {
                cidr_str = censor_netblock(&cidr_str);
            }
            let _ = writeln!(out, "\t{cidr_str:<18}\t{count:<4} Subdomain Name(s)");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AsnInfo;

    #[test]
    fn test_censor_domain_keeps_leftmost_label() {
        assert_eq!(censor_domain("www.example.com"), "www.xxxxxxx.xxx");
        assert_eq!(censor_domain("my-host.example.com"), "my-host.xxxxxxx.xxx");
        assert_eq!(censor_domain("localhost"), "localhost");
    }

    #[test]
    fn test_censor_ip_keeps_last_group() {
        assert_eq!(censor_ip("93.184.216.34"), "xx.xxx.xxx.34");
        assert_eq!(censor_ip("2001:db8::1"), "xxxx:xxx::1");
    }

    #[test]
    fn test_censor_netblock_keeps_prefix() {
        assert_eq!(censor_netblock("93.184.216.0/24"), "xx.xxx.xxx.x/24");
    }

    #[test]
    fn test_output_line() {
        let ips: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()];
        assert_eq!(
            output_line("www.example.com", &ips, false),
            "www.example.com 10.0.0.1,10.0.0.2"
        );
        assert_eq!(
            output_line("www.example.com", &ips, true),
            "www.xxxxxxx.xxx xx.x.x.1,xx.x.x.2"
        );
        assert_eq!(output_line("mail.example.com", &[], false), "mail.example.com");
    }

    #[test]
    fn test_summary_header_only_without_asns() {
        let text = render_summary(3, &AsnSummary::new(), false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert!(lines[1].starts_with("OWASP OAM Tool Suite v"));
        assert!(lines[1].ends_with(SITE));
        assert_eq!(lines[1].len(), WIDTH);
        assert_eq!(lines[2], "-".repeat(WIDTH));
        assert_eq!(lines[3], "3 names discovered");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_summary_asn_table() {
        let mut summary = AsnSummary::new();
        let mut info = AsnInfo {
            rir_name: "ARIN".to_string(),
            ..Default::default()
        };
        info.cidrs.insert("93.184.216.0/24".parse().unwrap(), 2);
        summary.insert(15133, info);

        let text = render_summary(1, &summary, false);
        assert!(text.contains("ASN: 15133 - ARIN\n"));
        assert!(text.contains("\t93.184.216.0/24   \t2    Subdomain Name(s)\n"));

        let censored = render_summary(1, &summary, true);
        assert!(censored.contains("ASN: xxxxx - xxxx\n"));
        assert!(censored.contains("\txx.xxx.xxx.x/24"));
    }

    #[test]
    fn test_demo_leaves_asn_zero_readable() {
        let mut summary = AsnSummary::new();
        summary.insert(
            0,
            AsnInfo {
                rir_name: "Not routed".to_string(),
                ..Default::default()
            },
        );
        let text = render_summary(0, &summary, true);
        assert!(text.contains("ASN: 0 - Not routed\n"));
    }
}
