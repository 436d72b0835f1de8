//! Root-domain scope matching.

/// Whether `name` equals one of the scope domains or is a subdomain of one.
///
/// Comparison is case-insensitive and ignores surrounding whitespace on the name.
pub fn domain_in_scope<S: AsRef<str>>(name: &str, scope: &[S]) -> bool {
    let n = name.trim().to_lowercase();
    scope.iter().any(|d| {
        let d = d.as_ref().trim().to_lowercase();
        !d.is_empty() && (n == d || n.ends_with(&format!(".{d}")))
    })
}

/// Trim, drop empties, and deduplicate a list of root domains, keeping first-seen order.
pub fn normalize_domains<I, S>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for d in domains {
        let d = d.as_ref().trim();
        if d.is_empty() || out.iter().any(|existing| existing.eq_ignore_ascii_case(d)) {
            continue;
        }
        out.push(d.to_string());
    }
    out
}
