//! Remote key and public URL construction.
//!
//! Keys always use `/` separators regardless of the host platform, and never
//! start with `/`.

use crate::config::Config;

/// Extensions of markup documents that are served independently of the
/// object store and therefore never uploaded.
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm"];

/// `<prefix>/<filename>` with separators normalised.
pub fn remote_key(prefix: &str, filename: &str) -> String {
    let filename = normalize_filename(filename);
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        filename
    } else {
        format!("{prefix}/{filename}")
    }
}

/// Convert a build-relative filename to `/`-separated form without leading
/// `./` or `/` segments.
pub fn normalize_filename(filename: &str) -> String {
    filename
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// True for generated markup documents (`index.html`, `about.HTM`, ...).
pub fn is_markup(filename: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    MARKUP_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Public path the build tool should emit assets under:
/// `<publicPath>/<prefix>/`.
///
/// Joins with exactly one `/` between segments while leaving a URL scheme's
/// `//` intact.
pub fn public_path(config: &Config) -> String {
    join_public_path(config.public_path(), config.prefix())
}

/// See [`public_path`].
pub fn join_public_path(base: &str, prefix: &str) -> String {
    let base = base.trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    match (base.is_empty(), prefix.is_empty()) {
        (true, true) => "/".to_owned(),
        (true, false) => format!("/{prefix}/"),
        (false, true) => format!("{base}/"),
        (false, false) => format!("{base}/{prefix}/"),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("webDist", "js/app.js", "webDist/js/app.js")]
    #[case("webDist/", "/js/app.js", "webDist/js/app.js")]
    #[case("site", "./css\\main.css", "site/css/main.css")]
    #[case("", "favicon.ico", "favicon.ico")]
    fn builds_remote_keys(#[case] prefix: &str, #[case] file: &str, #[case] expected: &str) {
        assert_eq!(remote_key(prefix, file), expected);
    }

    #[rstest]
    #[case("index.html", true)]
    #[case("nested/page.HTML", true)]
    #[case("legacy.htm", true)]
    #[case("app.js", false)]
    #[case("html/app.css", false)]
    #[case("report.html.gz", false)]
    fn detects_markup(#[case] file: &str, #[case] expected: bool) {
        assert_eq!(is_markup(file), expected);
    }

    #[rstest]
    #[case("https://cdn.example.com", "webDist", "https://cdn.example.com/webDist/")]
    #[case("https://cdn.example.com/", "/webDist/", "https://cdn.example.com/webDist/")]
    #[case("//cdn.example.com/static", "v2", "//cdn.example.com/static/v2/")]
    #[case("/", "webDist", "/webDist/")]
    fn joins_public_path(#[case] base: &str, #[case] prefix: &str, #[case] expected: &str) {
        assert_eq!(join_public_path(base, prefix), expected);
    }
}
