use sha2::{Digest, Sha256};
use url::Url;

const MAX_NAME_LEN: usize = 120;

/// Local filename for a downloaded digest: the url's last path segment made
/// filesystem-safe, or `digest--{short_hash(url)}.zip` when nothing usable remains.
pub fn download_file_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(sanitize)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("digest--{}.zip", short_hash(url.as_str())))
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return String::new();
    }

    // Collapse runs of underscores.
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut name = truncate_keeping_extension(compacted);
    let stem_len = name.find('.').unwrap_or(name.len());
    if is_reserved_windows_name(&name[..stem_len]) {
        name.insert(stem_len, '_');
    }
    name
}

fn truncate_keeping_extension(name: String) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        return name;
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if name.len() - dot <= 10 => (&name[..dot], &name[dot..]),
        _ => (name.as_str(), ""),
    };
    let keep = MAX_NAME_LEN.saturating_sub(ext.chars().count());
    let mut truncated: String = stem.chars().take(keep).collect();
    truncated.push_str(ext);
    truncated
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
