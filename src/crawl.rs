use std::ops::RangeInclusive;
use std::sync::Arc;

use chrono::Local;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::task::{spawn_blocking, JoinSet};
use url::Url;

use crate::{info_time, Error, Result};

/// Every issue published in a year is linked from the archive page as a cover thumbnail.
const ISSUE_LINK_SELECTOR: &str = "a.highlight-image-linked";
const ISSUE_TOC_SELECTOR: &str = "ul.issue-toc.item-list";
const PDF_LINK_SELECTOR: &str = "a.highwire-variant-link.variant-full-textpdf.link-icon";

/// Where and what to crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Archive url prefix, the year gets appended to it.
    pub base_url: String,
    pub years: RangeInclusive<u32>,
}

/// One issue page worth of extracted data: which issue it is and the
/// full-text pdf urls in the order they appear in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub volume: u32,
    pub issue: u32,
    pub pdf_urls: Vec<Url>,
}

/// Crawls the archive page of every year in the range and returns the
/// extracted issues. The per-year fetches run concurrently; redirects and
/// connection reuse are reqwest's business.
pub async fn crawl_archive(cfg: &CrawlConfig, client: &Client) -> Result<Vec<Issue>> {
    let mut year_tasks = JoinSet::new();
    for year in cfg.years.clone() {
        let url = format!("{}{}", cfg.base_url, year);
        info_time!("Requesting archive page: {}", url);
        year_tasks.spawn({
            let client = client.clone();
            async move { crawl_year(client, url).await }
        });
    }

    let mut issues = Vec::new();
    while let Some(task) = year_tasks.join_next().await {
        issues.extend(task??);
    }
    Ok(issues)
}

/// Fetches one yearly archive page, follows every issue link on it and
/// extracts an [`Issue`] per issue page.
async fn crawl_year(client: Client, archive_url: String) -> Result<Vec<Issue>> {
    let archive_url = Url::parse(&archive_url)?;
    let html = fetch_html(&client, &archive_url).await?;
    let issue_urls = parse_archive_page(html.into(), archive_url).await?;

    let mut issue_tasks = JoinSet::new();
    for issue_url in issue_urls {
        issue_tasks.spawn({
            let client = client.clone();
            async move {
                let html = fetch_html(&client, &issue_url).await?;
                parse_issue_page(html.into(), issue_url).await
            }
        });
    }

    let mut issues = Vec::new();
    while let Some(task) = issue_tasks.join_next().await {
        let issue = task??;
        info_time!(
            "Volume {} Issue {}: {} pdfs",
            issue.volume,
            issue.issue,
            issue.pdf_urls.len()
        );
        issues.push(issue);
    }
    Ok(issues)
}

async fn fetch_html(client: &Client, url: &Url) -> Result<String> {
    let res = client.get(url.clone()).send().await?;
    let html = res.error_for_status()?.text().await?;
    Ok(html)
}

/// Extracts the issue-page links from a yearly archive page.
/// Parsing is CPU bound, so it runs on the blocking pool.
async fn parse_archive_page(html: Arc<String>, page_url: Url) -> Result<Vec<Url>> {
    spawn_blocking(move || extract_issue_links(&html, &page_url)).await?
}

/// Extracts volume/issue numbers and the pdf urls from an issue page.
async fn parse_issue_page(html: Arc<String>, page_url: Url) -> Result<Issue> {
    spawn_blocking(move || extract_issue(&html, &page_url)).await?
}

fn extract_issue_links(html: &str, page_url: &Url) -> Result<Vec<Url>> {
    let doc = Html::parse_document(html);
    let link_selector = create_selector(ISSUE_LINK_SELECTOR)?;

    let mut issue_urls = Vec::new();
    for tag_a in doc.select(&link_selector) {
        if let Some(href) = tag_a.value().attr("href") {
            issue_urls.push(page_url.join(href)?);
        }
    }
    Ok(issue_urls)
}

fn extract_issue(html: &str, page_url: &Url) -> Result<Issue> {
    let (volume, issue) = volume_and_issue(page_url)?;

    let doc = Html::parse_document(html);
    let toc_selector = create_selector(ISSUE_TOC_SELECTOR)?;
    let pdf_selector = create_selector(PDF_LINK_SELECTOR)?;

    // Only links inside the table of contents count, the page carries
    // full-text pdf links elsewhere too.
    let mut pdf_urls = Vec::new();
    for tag_ul in doc.select(&toc_selector) {
        for tag_a in tag_ul.select(&pdf_selector) {
            if let Some(href) = tag_a.value().attr("href") {
                pdf_urls.push(page_url.join(href)?);
            }
        }
    }

    Ok(Issue {
        volume,
        issue,
        pdf_urls,
    })
}

/// The issue url is expected to end in `/<volume>/<issue>`.
/// Anything else means the site changed shape and is fatal.
fn volume_and_issue(url: &Url) -> Result<(u32, u32)> {
    let shape_err = || Error::IssueUrlShape(url.to_string());

    let mut segments: Vec<&str> = url
        .path_segments()
        .ok_or_else(shape_err)?
        .filter(|s| !s.is_empty())
        .collect();
    let issue = segments
        .pop()
        .and_then(|s| s.parse().ok())
        .ok_or_else(shape_err)?;
    let volume = segments
        .pop()
        .and_then(|s| s.parse().ok())
        .ok_or_else(shape_err)?;
    Ok((volume, issue))
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}
