pub mod aggregate;
pub mod downloads;
pub mod issues;
pub mod metrika;
pub mod patterns;
pub mod period;
pub mod query;
pub mod report;

#[cfg(test)]
mod tests;

// Re-export key types and functions for easier access
pub use crate::aggregate::{process, ResultSet, Row};
pub use crate::downloads::{parse_downloads_log, Download};
pub use crate::issues::{parse_issue_page, Article, IssueCache};
pub use crate::metrika::{
    AnalyticsApi, ApiEntry, ApiError, ApiResponse, MetrikaClient, ProviderQueryError,
};
pub use crate::patterns::{match_path, ArticleMatch, Language};
pub use crate::period::{InvalidPeriod, Period};
pub use crate::query::{set, update, Fragment, Param, Query};
pub use crate::report::{
    base_query, gather_issue_data, views_by_city, views_by_country, views_of_issues,
    write_issue_report, write_user_reports, ArticleData, Issue,
};
