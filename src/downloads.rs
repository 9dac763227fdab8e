use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Url;

use crate::patterns::match_path;

/// Lines per record in the manually exported downloads log: the download-page
/// URL, three unused fields, then the download count.
const RECORD_LINES: usize = 5;

/// Counts below this are sampled too thinly to be trusted and are reported as
/// unknown.
const MIN_RELIABLE_COUNT: u64 = 3;

/// Accumulated downloads of one article. `count` is `None` when every log
/// entry for the article was below the reliability threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub id: String,
    pub count: Option<u64>,
}

/// Parse the downloads log, summing counts per article+language key.
///
/// Entries whose URL is not an article page are skipped silently.
pub fn parse_downloads_log(path: &Path) -> Result<HashMap<String, Download>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read downloads log {}", path.display()))?;

    let lines: Vec<&str> = text.lines().collect();
    let mut articles: HashMap<String, Download> = HashMap::new();

    for record in lines.chunks(RECORD_LINES) {
        if record.len() < RECORD_LINES {
            if record.iter().any(|line| !line.trim().is_empty()) {
                log::warn!("ignoring truncated record at end of downloads log");
            }
            break;
        }

        let url = record[0].trim();
        let count: u64 = record[RECORD_LINES - 1]
            .trim()
            .parse()
            .with_context(|| format!("Invalid download count for {}", url))?;

        let Some(matched) = match_path(&url_path(url)) else {
            continue;
        };
        let Some(id) = matched.id else {
            // Issue landing pages also show up in the log; only articles count.
            continue;
        };

        let key = format!("{}{}", id, matched.language.suffix());
        let entry = articles.entry(key).or_insert(Download { id, count: None });
        if count >= MIN_RELIABLE_COUNT {
            entry.count = Some(entry.count.unwrap_or(0) + count);
        }
    }

    log::info!("downloads log: {} articles", articles.len());
    Ok(articles)
}

/// The log may hold absolute URLs or bare paths.
fn url_path(url: &str) -> String {
    match Url::parse(url) {
        // Absolute URL: take its path component.
        Ok(parsed) => parsed.path().to_string(),
        // Bare path: strip any query or fragment.
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    }
}
