//! Image download to the attachment tree.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;
use ureq::Agent;
use url::Url;

use crate::error::SiteError;

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Downloads images referenced by item bodies.
pub struct ImageFetcher {
    agent: Agent,
}

impl ImageFetcher {
    /// Create a fetcher with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .build()
            .into();
        Self { agent }
    }

    /// Resolve `src` against the blog link and download it to
    /// `<blog_dir>/a/<uid>/<filename>`.
    ///
    /// # Errors
    ///
    /// Returns an error for unresolvable URLs, failed requests, or
    /// filesystem failures. Callers treat these as per-image, non-fatal.
    pub fn download(
        &self,
        blog_link: &str,
        src: &str,
        blog_dir: &Path,
        uid: &str,
    ) -> Result<PathBuf, SiteError> {
        let resolved = Url::parse(blog_link)?.join(src)?;
        let target = attachment_path(blog_dir, uid, &resolved);

        info!(url = %resolved, target = %target.display(), "downloading image");

        let response = self.agent.get(resolved.as_str()).call()?;
        let bytes = response.into_body().read_to_vec()?;

        if let Some(dir) = target.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&target, bytes)?;
        Ok(target)
    }
}

impl Default for ImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Attachment path for a resolved image URL: `a/<uid>/<last path segment>`.
fn attachment_path(blog_dir: &Path, uid: &str, url: &Url) -> PathBuf {
    let filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("image");
    blog_dir.join("a").join(uid).join(filename)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_attachment_path_uses_last_segment() {
        let url = Url::parse("https://blog.example.com/uploads/2020/01/photo.png").unwrap();
        let path = attachment_path(Path::new("/out"), "my-post", &url);
        assert_eq!(path, PathBuf::from("/out/a/my-post/photo.png"));
    }

    #[test]
    fn test_attachment_path_fallback_name() {
        let url = Url::parse("https://blog.example.com/").unwrap();
        let path = attachment_path(Path::new("/out"), "my-post", &url);
        assert_eq!(path, PathBuf::from("/out/a/my-post/image"));
    }

    #[test]
    fn test_relative_src_resolution() {
        let base = Url::parse("https://blog.example.com/archive/").unwrap();
        let resolved = base.join("/uploads/pic.jpg").unwrap();
        assert_eq!(resolved.as_str(), "https://blog.example.com/uploads/pic.jpg");
    }
}
