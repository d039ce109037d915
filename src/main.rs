use std::path::Path;

use chrono::Local;
use scirob::crawl::{crawl_archive, CrawlConfig};
use scirob::{
    combine, download, info_time, Result, BASE_URL, CURRENT_YEAR, DOWNLOADS_DIR, START_YEAR,
};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let client = reqwest::Client::new();

    let cfg = CrawlConfig {
        base_url: BASE_URL.to_string(),
        years: START_YEAR..=CURRENT_YEAR,
    };
    let root = Path::new(DOWNLOADS_DIR);

    let issues = crawl_archive(&cfg, &client).await?;
    info_time!(start_time, "Crawled {} issues", issues.len());

    for issue in &issues {
        download::download_issue(root, &client, issue).await?;
    }
    info_time!(start_time, "Downloaded all issues");

    let issue_files = combine::combine_downloads(root)?;
    info_time!(start_time, "Combined {} issues, full program time:", issue_files.len());

    Ok(())
}
