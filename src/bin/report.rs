use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;

use iorj_report::{
    base_query, gather_issue_data, parse_downloads_log, views_by_city, views_by_country,
    views_of_issues, write_issue_report, write_user_reports, IssueCache, MetrikaClient, Period,
};

/// Generate usage reports for the journal website
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// First day of the reporting period (YYYY-MM-DD)
    #[arg(long)]
    from: NaiveDate,

    /// Last day of the reporting period (YYYY-MM-DD)
    #[arg(long)]
    to: NaiveDate,

    /// Metrika counter id of the site
    #[arg(long, default_value = "32635220")]
    site_id: String,

    /// Domain of the journal site
    #[arg(long, default_value = "iorj.hse.ru")]
    domain: String,

    /// OAuth token for the analytics API
    #[arg(long, env = "METRIKA_TOKEN", hide_env_values = true)]
    token: String,

    /// Directory the report files are written to
    #[arg(long, default_value = "report")]
    output_dir: PathBuf,

    /// Directory of cached issue pages
    #[arg(long, default_value = "archive/issues")]
    issues_dir: PathBuf,

    /// Downloads log exported from the analytics console
    #[arg(long)]
    downloads_log: Option<PathBuf>,

    /// Issue to include in the article report (YYYY-V-N), repeatable
    #[arg(long = "issue")]
    issues: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let period = Period::new(cli.from, cli.to)?;
    let client = MetrikaClient::new(cli.token.clone());
    let base = base_query(&cli.site_id, &cli.domain);

    fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("Failed to create output directory {}", cli.output_dir.display())
    })?;

    println!("Collecting audience reports for {}...", period);
    let by_country = views_by_country(&client, &base, period)?;
    let by_city = views_by_city(&client, &base, period)?;
    write_user_reports(&cli.output_dir, &by_country, &by_city)?;
    println!(
        "Audience reports written ({} countries, {} cities)",
        by_country.len(),
        by_city.len()
    );

    if !cli.issues.is_empty() {
        println!("Collecting article report for {} issues...", cli.issues.len());
        let downloads = match &cli.downloads_log {
            Some(path) => parse_downloads_log(path)?,
            None => {
                log::warn!("no downloads log given, download counts will be unknown");
                HashMap::new()
            }
        };

        let cache = IssueCache::new(cli.issues_dir.clone(), format!("https://{}", cli.domain));
        let issue_views = views_of_issues(&client, &base, period, &cli.issues)?;
        let issues = gather_issue_data(&cache, &issue_views, &downloads, &cli.issues)?;
        write_issue_report(&cli.output_dir, &issues)?;
        println!("Article report written");
    }

    println!("Reports saved to {}", cli.output_dir.display());
    Ok(())
}
