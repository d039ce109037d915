use std::path::{Path, PathBuf};

use chrono::Local;
use reqwest::Client;
use tokio::{fs, io::AsyncWriteExt};
use url::Url;

use crate::crawl::Issue;
use crate::{info_time, Result};

/// Downloads every pdf of an issue into `<root>/Volume <V> Issue <I>/`.
///
/// A single failed file is reported and skipped, the rest of the issue
/// keeps downloading. Files that already exist on disk are left alone.
pub async fn download_issue(root: &Path, client: &Client, issue: &Issue) -> Result<()> {
    let dir = root.join(issue_dir_name(issue.volume, issue.issue));
    fs::create_dir_all(&dir).await?;

    for (index, pdf_url) in issue.pdf_urls.iter().enumerate() {
        let dest = destination_path(root, issue.volume, issue.issue, index + 1, pdf_url);
        if fs::try_exists(&dest).await? {
            info_time!("Already downloaded: {}", dest.display());
            continue;
        }
        if let Err(err) = download_file(client, pdf_url, &dest).await {
            info_time!("Failed to download {}: {}", pdf_url, err);
        }
    }
    Ok(())
}

/// Destination for the pdf at 1-based `position` within an issue:
/// `<root>/Volume <V> Issue <I>/[<position>] <original-basename>`.
/// The bracketed position is what the combine stage later sorts on.
pub fn destination_path(
    root: &Path,
    volume: u32,
    issue: u32,
    position: usize,
    url: &Url,
) -> PathBuf {
    let basename = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .unwrap_or("unnamed.pdf");
    root.join(issue_dir_name(volume, issue))
        .join(format!("[{position}] {basename}"))
}

fn issue_dir_name(volume: u32, issue: u32) -> String {
    format!("Volume {volume} Issue {issue}")
}

async fn download_file(client: &Client, url: &Url, dest: &Path) -> Result<()> {
    let res = client.get(url.clone()).send().await?;
    let bytes = res.error_for_status()?.bytes().await?;

    let mut file = fs::File::create(dest).await?;
    file.write_all(&bytes).await?;
    info_time!("Downloaded {} -> {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn destinations_follow_toc_order() {
        let issue = Issue {
            volume: 4,
            issue: 26,
            pdf_urls: vec![
                url("https://robotics.sciencemag.org/content/robotics/4/26/a.pdf"),
                url("https://robotics.sciencemag.org/content/robotics/4/26/b.pdf"),
                url("https://robotics.sciencemag.org/content/robotics/4/26/c.pdf"),
            ],
        };

        let root = Path::new("downloads");
        let dests: Vec<PathBuf> = issue
            .pdf_urls
            .iter()
            .enumerate()
            .map(|(i, u)| destination_path(root, issue.volume, issue.issue, i + 1, u))
            .collect();

        assert_eq!(
            dests,
            vec![
                Path::new("downloads/Volume 4 Issue 26/[1] a.pdf"),
                Path::new("downloads/Volume 4 Issue 26/[2] b.pdf"),
                Path::new("downloads/Volume 4 Issue 26/[3] c.pdf"),
            ]
        );
    }

    #[test]
    fn basename_ignores_query_string() {
        let dest = destination_path(
            Path::new("downloads"),
            3,
            14,
            2,
            &url("https://robotics.sciencemag.org/files/b.pdf?download=1"),
        );
        assert_eq!(dest, Path::new("downloads/Volume 3 Issue 14/[2] b.pdf"));
    }

    #[tokio::test]
    async fn existing_files_are_left_alone() {
        let root = tempfile::tempdir().unwrap();
        let issue = Issue {
            volume: 4,
            issue: 26,
            // Nothing listens on port 1, so an actual fetch would fail.
            pdf_urls: vec![url("http://127.0.0.1:1/a.pdf")],
        };

        let dir = root.path().join("Volume 4 Issue 26");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let dest = dir.join("[1] a.pdf");
        tokio::fs::write(&dest, b"already here").await.unwrap();

        let client = Client::new();
        download_issue(root.path(), &client, &issue).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"already here");
    }

    #[tokio::test]
    async fn failed_download_doesnt_abort_the_issue() {
        let root = tempfile::tempdir().unwrap();
        let issue = Issue {
            volume: 4,
            issue: 26,
            pdf_urls: vec![
                url("http://127.0.0.1:1/a.pdf"),
                url("http://127.0.0.1:1/b.pdf"),
                url("http://127.0.0.1:1/c.pdf"),
            ],
        };

        let dir = root.path().join("Volume 4 Issue 26");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let last = dir.join("[3] c.pdf");
        tokio::fs::write(&last, b"kept").await.unwrap();

        // The first two fetches fail, the loop still reaches the third
        // entry and the whole issue still comes back Ok.
        let client = Client::new();
        download_issue(root.path(), &client, &issue).await.unwrap();
        assert!(!dir.join("[1] a.pdf").exists());
        assert!(!dir.join("[2] b.pdf").exists());
        assert_eq!(tokio::fs::read(&last).await.unwrap(), b"kept");
    }

    #[test]
    fn empty_basename_gets_a_placeholder() {
        let dest = destination_path(
            Path::new("downloads"),
            3,
            14,
            1,
            &url("https://robotics.sciencemag.org/"),
        );
        assert_eq!(
            dest,
            Path::new("downloads/Volume 3 Issue 14/[1] unnamed.pdf")
        );
    }
}
