use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};

use crate::patterns::Language;

/// Article metadata scraped from an issue's table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub url: String,
    pub issue: String,
    pub language: Language,
}

/// Local cache of issue HTML pages, one file per issue and language.
///
/// Pages are fetched from the journal site once and reused on later runs, so
/// a report can be regenerated without re-downloading anything.
pub struct IssueCache {
    cache_dir: PathBuf,
    base_url: String,
    http: Client,
}

impl IssueCache {
    pub fn new(cache_dir: PathBuf, base_url: String) -> Self {
        IssueCache {
            cache_dir,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Return the issue page HTML, fetching and persisting it if not cached.
    pub fn load(&self, issue: &str, language: Language) -> Result<String> {
        let file = self
            .cache_dir
            .join(format!("{}{}.html", issue, language.suffix()));

        if file.exists() {
            return fs::read_to_string(&file)
                .with_context(|| format!("Failed to read cached issue page {}", file.display()));
        }

        let url = self.page_url(issue, language);
        log::info!("fetching {}", url);
        let html = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("Failed to fetch issue page {}", url))?
            .error_for_status()
            .with_context(|| format!("Issue page {} not available", url))?
            .text()
            .context("Failed to get response text")?;

        fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Failed to create cache directory {}", self.cache_dir.display())
        })?;
        fs::write(&file, &html)
            .with_context(|| format!("Failed to write cached issue page {}", file.display()))?;

        Ok(html)
    }

    fn page_url(&self, issue: &str, language: Language) -> String {
        match language {
            Language::Ru => format!("{}/{}.html", self.base_url, issue),
            Language::En => format!("{}/en/{}.html", self.base_url, issue),
        }
    }
}

/// Extract article metadata from an issue page.
///
/// The layout is fixed: the table of contents lives in
/// `table.issue_type2_maintable`, one `div.link` per article with the title in
/// `span.article_title` (falling back to `p.text` when the span is empty),
/// authors in `<i>` elements, and the article URL on the anchor wrapping the
/// title.
pub fn parse_issue_page(html: &str, issue: &str) -> Result<Vec<Article>> {
    let document = Html::parse_document(html);

    let item_selector = Selector::parse("table.issue_type2_maintable div.link").unwrap();
    let title_selector = Selector::parse("span.article_title").unwrap();
    let fallback_title_selector = Selector::parse("p.text").unwrap();
    let author_selector = Selector::parse("i").unwrap();

    let mut articles = Vec::new();

    for item in document.select(&item_selector) {
        let authors: Vec<String> = item
            .select(&author_selector)
            .map(|author| author.text().collect::<String>().trim().to_string())
            .collect();

        let title_element = item
            .select(&title_selector)
            .next()
            .with_context(|| format!("Article without a title in issue {}", issue))?;

        let mut title = title_element.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            title = item
                .select(&fallback_title_selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .unwrap_or_default();
        }

        let url = title_element
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|anchor| anchor.value().attr("href"))
            .with_context(|| format!("Article '{}' has no link in issue {}", title, issue))?
            .to_string();

        let language = if url.contains("/en/") {
            Language::En
        } else {
            Language::Ru
        };

        articles.push(Article {
            id: id_from_url(&url),
            title,
            authors,
            url,
            issue: issue.to_string(),
            language,
        });
    }

    Ok(articles)
}

/// Article id is the URL basename without its extension.
fn id_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => base.to_string(),
    }
}
