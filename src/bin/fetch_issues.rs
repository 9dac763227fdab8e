use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use iorj_report::{IssueCache, Language};

/// Pre-populate the local cache of issue pages
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Issues to fetch (YYYY-V-N)
    #[arg(required = true)]
    issues: Vec<String>,

    /// Domain of the journal site
    #[arg(long, default_value = "iorj.hse.ru")]
    domain: String,

    /// Directory of cached issue pages
    #[arg(long, default_value = "archive/issues")]
    issues_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let cache = IssueCache::new(cli.issues_dir.clone(), format!("https://{}", cli.domain));

    for issue in &cli.issues {
        for language in Language::ALL {
            cache.load(issue, language)?;
            println!("cached {}{}", issue, language.suffix());
        }
    }

    Ok(())
}
