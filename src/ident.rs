//! Identifier casing shared by the resolver and the fix-up pass.

/// Words always written in upper case.
const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// Split `s` into words at separators and case boundaries.
///
/// `nodeId` gives `node`, `Id`; `CSSMedia` gives `CSS`, `Media`;
/// `Page.frame_id` gives `Page`, `frame`, `id`.
fn words(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let chars: Vec<(usize, char)> = s.char_indices().collect();
    let mut start: Option<usize> = None;
    for (i, &(pos, c)) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if let Some(st) = start.take() {
                out.push(&s[st..pos]);
            }
            continue;
        }
        let Some(st) = start else {
            start = Some(pos);
            continue;
        };
        let prev = chars[i - 1].1;
        let next = chars.get(i + 1).map(|&(_, n)| n);
        let boundary = c.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next.is_some_and(|n| n.is_lowercase())));
        if boundary {
            out.push(&s[st..pos]);
            start = Some(pos);
        }
    }
    if let Some(st) = start {
        out.push(&s[st..]);
    }
    out
}

/// Upper camel case identifier with common initialisms upper-cased.
///
/// ```
/// use pdlgen::ident::camel_identifier;
/// assert_eq!(camel_identifier("NodeId"), "NodeID");
/// assert_eq!(camel_identifier("setPauseOnExceptions.state"), "SetPauseOnExceptionsState");
/// ```
pub fn camel_identifier(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in words(s) {
        let upper = word.to_uppercase();
        if INITIALISMS.contains(&upper.as_str()) {
            out.push_str(&upper);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
