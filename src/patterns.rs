use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// Path grammar of article and issue pages: an optional /en language prefix,
// an issue segment (year-volume-number), then either the issue page suffix
// or a numeric article id with arbitrary non-digit trailing characters.
static ARTICLE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<lang>/en)?/(?P<issue>\d{4}-\d+-\d+)(?:\.html|/(?P<id>\d+)\D*)?$").unwrap()
});

/// Site language. The Russian version lives at the site root, the English one
/// under the `/en` prefix with `-en` suffixed cache and join keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Ru,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Ru, Language::En];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Ru => "ru",
            Language::En => "en",
        }
    }

    /// Suffix distinguishing the English variant of a per-article or
    /// per-issue key or file name.
    pub fn suffix(self) -> &'static str {
        match self {
            Language::Ru => "",
            Language::En => "-en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed identity of an article or issue page URL path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleMatch {
    /// Issue identifier in `YYYY-V-N` form.
    pub issue: String,
    /// Numeric article id; `None` on an issue landing page.
    pub id: Option<String>,
    pub language: Language,
}

impl ArticleMatch {
    /// Key joining analytics rows and download counts to one article, or
    /// `None` for an issue landing page.
    pub fn article_key(&self) -> Option<String> {
        self.id
            .as_ref()
            .map(|id| format!("{}{}", id, self.language.suffix()))
    }
}

/// Classify a URL path as an article or issue page.
///
/// A path outside the grammar yields `None`: it is simply not an article
/// page, never an error.
pub fn match_path(path: &str) -> Option<ArticleMatch> {
    let captures = ARTICLE_PATH.captures(path)?;

    let language = if captures.name("lang").is_some() {
        Language::En
    } else {
        Language::Ru
    };

    Some(ArticleMatch {
        issue: captures["issue"].to_string(),
        id: captures.name("id").map(|m| m.as_str().to_string()),
        language,
    })
}
