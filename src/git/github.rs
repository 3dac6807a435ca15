//! GitHub repository URL helpers

use regex::Regex;
use std::sync::OnceLock;

fn https_regex() -> &'static Regex {
    static HTTPS_REGEX: OnceLock<Regex> = OnceLock::new();
    HTTPS_REGEX.get_or_init(|| {
        Regex::new(r"^https?://(?:[^@/]+@)?github\.com/([^/]+)/([^/]+?)(?:\.git)?/?$")
            .expect("Invalid GitHub URL regex")
    })
}

/// Rewrites a GitHub HTTPS URL to its SSH form
///
/// `https://github.com/owner/repo` becomes `git@github.com:owner/repo.git`.
/// Anything that is not a GitHub HTTPS URL is returned unchanged.
pub fn to_ssh_url(url: &str) -> String {
    match https_regex().captures(url.trim()) {
        Some(caps) => format!("git@github.com:{}/{}.git", &caps[1], &caps[2]),
        None => url.to_string(),
    }
}

/// `ssh://` URLs and scp-style `user@host:path`
pub fn is_ssh_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("ssh://") || (url.contains('@') && url.contains(':') && !url.contains("://"))
}
