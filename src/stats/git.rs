use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use chrono::DateTime;

use crate::foundation::error::{WrapError, WrapResult};
use crate::stats::history::{CommitRecord, History, PullRequestRecord, ReleaseRecord};

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';
const WORK_TREE_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Collects [`History`] from a local git checkout.
///
/// Commits and tags come from `git`. Merged pull requests come from the `gh` CLI when it is
/// installed and authenticated; otherwise the PR list is empty and a warning is logged.
#[derive(Clone, Debug)]
pub struct GitHistorySource {
    pub repo_path: PathBuf,
    /// Upper bound for each spawned command.
    pub timeout: Duration,
    /// Query `gh` for merged pull requests.
    pub fetch_pull_requests: bool,
}

impl GitHistorySource {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            timeout: Duration::from_secs(60),
            fetch_pull_requests: true,
        }
    }

    /// Collect all records for `year`.
    ///
    /// Failing to read the commit log is fatal. Pull requests and tags degrade to empty.
    pub fn collect(&self, year: i32) -> WrapResult<History> {
        let repo_name = self.repo_name();
        tracing::info!(repo = %repo_name, year, "collecting repository history");

        let log = self.git(&[
            "log",
            &format!("--since={year}-01-01T00:00:00"),
            &format!("--until={}-01-01T00:00:00", year + 1),
            "--no-merges",
            "--numstat",
            "--pretty=format:%x1e%an%x1f%aI",
        ])?;
        let commits = parse_git_log(&log)?;

        let releases = match self.git(&[
            "for-each-ref",
            "--sort=creatordate",
            "--format=%(refname:short)%1f%(creatordate:iso-strict)",
            "refs/tags",
        ]) {
            Ok(out) => parse_tags(&out),
            Err(e) => {
                tracing::warn!(error = %e, "could not list tags; releases will be empty");
                Vec::new()
            }
        };

        let pull_requests = if self.fetch_pull_requests {
            self.pull_requests()
        } else {
            Vec::new()
        };

        Ok(History {
            repo_name,
            commits,
            pull_requests,
            releases,
        })
    }

    /// `owner/name` from the `origin` remote, falling back to the directory name.
    pub fn repo_name(&self) -> String {
        if let Ok(url) = self.git(&["remote", "get-url", "origin"])
            && let Some(name) = repo_name_from_remote(url.trim())
        {
            return name;
        }
        self.repo_path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "repository".to_string())
    }

    fn pull_requests(&self) -> Vec<PullRequestRecord> {
        let mut cmd = Command::new("gh");
        cmd.current_dir(&self.repo_path).args([
            "pr",
            "list",
            "--state",
            "merged",
            "--limit",
            "1000",
            "--json",
            "number,title,author,mergedAt,additions,deletions",
        ]);
        match run_with_timeout(cmd, self.timeout).and_then(|out| parse_gh_prs(&out)) {
            Ok(prs) => prs,
            Err(e) => {
                tracing::warn!(error = %e, "pull request data unavailable; PR count will be 0");
                Vec::new()
            }
        }
    }

    fn git(&self, args: &[&str]) -> WrapResult<String> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path).args(args);
        run_with_timeout(cmd, self.timeout)
    }
}

/// Run `cmd`, returning stdout as text. Kills the child once `timeout` elapses.
pub(crate) fn run_with_timeout(mut cmd: Command, timeout: Duration) -> WrapResult<String> {
    let program = format!("{:?}", cmd.get_program());
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| WrapError::history(format!("failed to spawn {program}: {e}")))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| WrapError::history(format!("failed to open {program} stdout")))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| WrapError::history(format!("failed to open {program} stderr")))?;
    let stdout_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stdout.read_to_end(&mut bytes).map(|_| bytes)
    });
    let stderr_drain = std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stderr.read_to_end(&mut bytes).map(|_| bytes)
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(WrapError::history(format!(
                    "{program} timed out after {:.1}s",
                    timeout.as_secs_f64()
                )));
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(20)),
            Err(e) => {
                return Err(WrapError::history(format!(
                    "failed to wait for {program}: {e}"
                )));
            }
        }
    };

    let stdout = stdout_drain
        .join()
        .map_err(|_| WrapError::history("stdout drain thread panicked"))?
        .map_err(|e| WrapError::history(format!("{program} stdout read failed: {e}")))?;
    let stderr = stderr_drain
        .join()
        .map_err(|_| WrapError::history("stderr drain thread panicked"))?
        .unwrap_or_default();

    if !status.success() {
        return Err(WrapError::history(format!(
            "{program} exited with status {status}: {}",
            String::from_utf8_lossy(&stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

/// Parse `git log --numstat --pretty=format:%x1e%an%x1f%aI`.
///
/// Binary files report `-` for their line counts and contribute zero lines.
pub(crate) fn parse_git_log(text: &str) -> WrapResult<Vec<CommitRecord>> {
    let mut out = Vec::new();
    for record in text.split(RECORD_SEP).filter(|r| !r.trim().is_empty()) {
        let mut lines = record.lines();
        let header = lines.next().unwrap_or_default();
        let (author, date) = header.split_once(FIELD_SEP).ok_or_else(|| {
            WrapError::history(format!("malformed git log header: {header:?}"))
        })?;
        let timestamp = DateTime::parse_from_rfc3339(date.trim())
            .map_err(|e| WrapError::history(format!("bad commit date {date:?}: {e}")))?;

        let mut lines_added = 0u64;
        let mut lines_deleted = 0u64;
        for stat in lines {
            let mut cols = stat.split('\t');
            let (Some(a), Some(d)) = (cols.next(), cols.next()) else {
                continue;
            };
            lines_added += a.trim().parse::<u64>().unwrap_or(0);
            lines_deleted += d.trim().parse::<u64>().unwrap_or(0);
        }

        out.push(CommitRecord {
            author: author.trim().to_string(),
            timestamp,
            lines_added,
            lines_deleted,
        });
    }
    Ok(out)
}

pub(crate) fn parse_tags(text: &str) -> Vec<ReleaseRecord> {
    text.lines()
        .filter_map(|line| {
            let (name, date) = line.split_once(FIELD_SEP)?;
            let created_at = DateTime::parse_from_rfc3339(date.trim()).ok()?;
            Some(ReleaseRecord {
                name: name.trim().to_string(),
                created_at,
            })
        })
        .collect()
}

#[derive(serde::Deserialize)]
struct GhAuthor {
    login: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPullRequest {
    number: u64,
    title: String,
    author: Option<GhAuthor>,
    merged_at: Option<String>,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
}

pub(crate) fn parse_gh_prs(json: &str) -> WrapResult<Vec<PullRequestRecord>> {
    let raw: Vec<GhPullRequest> =
        serde_json::from_str(json).map_err(|e| WrapError::serde(format!("gh output: {e}")))?;
    Ok(raw
        .into_iter()
        .filter_map(|p| {
            let merged_at = DateTime::parse_from_rfc3339(p.merged_at.as_deref()?).ok()?;
            Some(PullRequestRecord {
                number: p.number,
                title: p.title,
                author: p.author.map(|a| a.login).unwrap_or_default(),
                merged_at,
                lines: p.additions + p.deletions,
            })
        })
        .collect())
}

fn repo_name_from_remote(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/').trim_end_matches(".git");
    let path = if let Some((_, rest)) = trimmed.split_once("://") {
        rest.split_once('/').map(|(_, p)| p)?
    } else if let Some((_, p)) = trimmed.split_once(':') {
        p
    } else {
        trimmed
    };
    let segs = path.split('/').filter(|s| !s.is_empty()).collect::<Vec<_>>();
    match segs.as_slice() {
        [] => None,
        [name] => Some((*name).to_string()),
        [.., owner, name] => Some(format!("{owner}/{name}")),
    }
}

/// Return `true` when `path` is inside a git work tree (a subdirectory of a checkout counts).
pub fn is_git_repo(path: &Path) -> bool {
    let mut cmd = Command::new("git");
    cmd.arg("-C")
        .arg(path)
        .args(["rev-parse", "--is-inside-work-tree"]);
    match run_with_timeout(cmd, WORK_TREE_CHECK_TIMEOUT) {
        Ok(out) => out.trim() == "true",
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "not a git work tree");
            false
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stats/git.rs"]
mod tests;
