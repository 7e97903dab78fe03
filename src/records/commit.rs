//! GitHub commit records and their API payload shape

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Git identity attached to a commit (`commit.author` / `commit.committer`)
#[derive(Debug, Clone, Deserialize)]
pub struct GitUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub date: Option<DateTime<Utc>>,
}

/// GitHub account linked to a commit; null for identities GitHub can't match
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetails {
    pub author: Option<GitUser>,
    pub committer: Option<GitUser>,
    #[serde(default)]
    pub message: String,
}

/// A commit as returned by `GET /repos/{owner}/{repo}/commits`
#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetails,
    pub author: Option<GitHubUser>,
    pub committer: Option<GitHubUser>,
    #[serde(default)]
    pub html_url: String,
}

/// Flattened commit row for storage
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_date: Option<DateTime<Utc>>,
    pub committer_name: String,
    pub committer_email: String,
    pub committer_date: Option<DateTime<Utc>>,
    pub github_author_login: Option<String>,
    pub github_committer_login: Option<String>,
    pub html_url: String,
}

impl From<Commit> for CommitRecord {
    fn from(c: Commit) -> Self {
        let author = c.commit.author.unwrap_or_else(empty_user);
        let committer = c.commit.committer.unwrap_or_else(empty_user);

        Self {
            sha: c.sha,
            message: c.commit.message,
            author_name: author.name,
            author_email: author.email,
            author_date: author.date,
            committer_name: committer.name,
            committer_email: committer.email,
            committer_date: committer.date,
            github_author_login: c.author.map(|u| u.login),
            github_committer_login: c.committer.map(|u| u.login),
            html_url: c.html_url,
        }
    }
}

fn empty_user() -> GitUser {
    GitUser {
        name: String::new(),
        email: String::new(),
        date: None,
    }
}
