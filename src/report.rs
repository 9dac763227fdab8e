use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;

use anyhow::{ensure, Context, Result};

use crate::aggregate::{process, ResultSet};
use crate::downloads::Download;
use crate::issues::{parse_issue_page, Article, IssueCache};
use crate::metrika::AnalyticsApi;
use crate::patterns::{match_path, Language};
use crate::period::Period;
use crate::query::{set, update, Query};

/// Per-issue view/visitor metrics, keyed by article key (or plain language
/// name for the issue landing page itself).
pub type IssueViews = HashMap<String, HashMap<String, Vec<u64>>>;

/// Article metadata joined with its usage numbers. `downloads` is `None` when
/// the downloads log has no reliable count for the article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleData {
    pub article: Article,
    pub views: u64,
    pub visitors: u64,
    pub downloads: Option<u64>,
}

/// One language edition of an issue with its articles, ordered by descending
/// view count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub number: String,
    pub language: Language,
    pub views: u64,
    pub visitors: u64,
    pub articles: Vec<ArticleData>,
}

/// Query parameters shared by every report: counter id, full accuracy,
/// pageview metrics for the journal domain sorted by views. The period is not
/// part of the base; the request processor supplies it per (sub-)period.
pub fn base_query(site_id: &str, domain: &str) -> Query {
    Query::new().apply(vec![
        set("ids", site_id),
        set("accuracy", "full"),
        set("limit", 50),
        set("filters", format!("ym:pv:URLDomain=='{}'", domain)),
        set("metrics", "ym:pv:pageviews,ym:pv:users"),
        set("sort", "-ym:pv:pageviews"),
    ])
}

/// Views and visitors per country, with the ISO country code as an auxiliary
/// dimension.
pub fn views_by_country<A: AnalyticsApi>(
    api: &A,
    base: &Query,
    period: Period,
) -> Result<ResultSet> {
    let query = base.clone().apply(vec![
        set("dimensions", "ym:pv:regionCountry"),
        set("limit", 300),
    ]);
    process(api, &query, &["name", "iso_name"], period)
}

/// Views and visitors per Russian city.
pub fn views_by_city<A: AnalyticsApi>(api: &A, base: &Query, period: Period) -> Result<ResultSet> {
    let query = base.clone().apply(vec![
        set("dimensions", "ym:pv:regionCity"),
        update("filters", |f| {
            format!("{} AND ym:pv:regionCountryIsoName=='RU'", f)
        }),
    ]);
    process(api, &query, &["name"], period)
}

/// Views and visitors of the given issues' pages, bucketed per issue and
/// keyed by article (or by language for the issue page itself). Paths that
/// are not article pages, or belong to other issues, are skipped.
pub fn views_of_issues<A: AnalyticsApi>(
    api: &A,
    base: &Query,
    period: Period,
    issues: &[String],
) -> Result<IssueViews> {
    let query = base.clone().apply(vec![
        set("dimensions", "ym:pv:URLPath"),
        set("limit", 5000),
    ]);
    let pages = process(api, &query, &["name"], period)?;

    let mut issue_views: IssueViews = issues
        .iter()
        .map(|issue| (issue.clone(), HashMap::new()))
        .collect();

    for (path, row) in pages.iter() {
        let Some(matched) = match_path(path) else {
            continue;
        };
        let Some(views) = issue_views.get_mut(&matched.issue) else {
            continue;
        };
        let key = match matched.article_key() {
            Some(key) => key,
            None => matched.language.to_string(),
        };
        views.insert(key, row.metrics.clone());
    }

    Ok(issue_views)
}

/// Join scraped article metadata with view metrics and download counts, one
/// `Issue` per issue and language, articles sorted by descending views.
pub fn gather_issue_data(
    cache: &IssueCache,
    issue_views: &IssueViews,
    downloads: &HashMap<String, Download>,
    issues: &[String],
) -> Result<Vec<Issue>> {
    let empty = HashMap::new();
    let mut result = Vec::new();

    for number in issues {
        let views = issue_views.get(number).unwrap_or(&empty);

        for language in Language::ALL {
            let html = cache.load(number, language)?;

            let mut articles = Vec::new();
            for article in parse_issue_page(&html, number)? {
                ensure!(
                    article.language == language,
                    "article {} on the {} page of issue {} links to the {} edition",
                    article.id,
                    language,
                    number,
                    article.language
                );

                let key = format!("{}{}", article.id, article.language.suffix());
                let downloads = downloads.get(&key).and_then(|d| d.count);
                articles.push(ArticleData {
                    views: metric(views.get(&key), 0),
                    visitors: metric(views.get(&key), 1),
                    downloads,
                    article,
                });
            }
            articles.sort_by_key(|article| Reverse(article.views));

            let totals = views.get(language.as_str());
            result.push(Issue {
                number: number.clone(),
                language,
                views: metric(totals, 0),
                visitors: metric(totals, 1),
                articles,
            });
        }
    }

    Ok(result)
}

// Absent metrics mean no recorded activity, not an error.
fn metric(metrics: Option<&Vec<u64>>, index: usize) -> u64 {
    metrics.and_then(|m| m.get(index)).copied().unwrap_or(0)
}

/// Write one semicolon-delimited report file.
pub fn write_csv<I>(dir: &Path, name: &str, rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let path = dir.join(format!("{}.csv", name));
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_path(&path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;

    for row in rows {
        writer.write_record(&row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write report file {}", path.display()))
}

/// Write the audience reports: views per country (the auxiliary ISO code is
/// dropped) and views per Russian city.
pub fn write_user_reports(dir: &Path, by_country: &ResultSet, by_city: &ResultSet) -> Result<()> {
    write_csv(
        dir,
        "views_by_country",
        by_country.iter().map(|(name, row)| {
            let mut record = vec![name.to_string()];
            record.extend(row.metrics.iter().map(u64::to_string));
            record
        }),
    )?;

    write_csv(
        dir,
        "views_by_city",
        by_city.iter().map(|(name, row)| {
            let mut record = vec![name.to_string()];
            record.extend(row.aux.iter().cloned());
            record.extend(row.metrics.iter().map(u64::to_string));
            record
        }),
    )
}

/// Write the per-issue article report: for each issue edition a totals row
/// followed by one row per article.
pub fn write_issue_report(dir: &Path, issues: &[Issue]) -> Result<()> {
    let mut rows = Vec::new();

    for issue in issues {
        let label = issue_label(&issue.number);
        rows.push(vec![
            label.clone(),
            issue.language.to_string(),
            String::new(),
            String::new(),
            issue.views.to_string(),
            issue.visitors.to_string(),
            String::new(),
        ]);

        for data in &issue.articles {
            rows.push(vec![
                label.clone(),
                issue.language.to_string(),
                data.article.title.clone(),
                data.article.authors.join(", "),
                data.views.to_string(),
                data.visitors.to_string(),
                match data.downloads {
                    Some(count) => count.to_string(),
                    None => "-".to_string(),
                },
            ]);
        }
    }

    write_csv(dir, "article_data", rows)
}

/// `2017-12-1` is displayed as `2017 #1`: readers know issues by year and
/// number, the volume is dropped.
fn issue_label(number: &str) -> String {
    let mut parts = number.split('-');
    let year = parts.next().unwrap_or(number);
    let no = parts.nth(1).unwrap_or("");
    format!("{} #{}", year, no)
}
