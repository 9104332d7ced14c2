//! Parsing of porcelain git output into the structured types [`super::GitOps`]
//! returns. Kept separate from `process.rs` so the parsing logic can be unit
//! tested against literal captured output without spawning `git`.

use super::RepoStatus;

/// Parse `git status --porcelain=v2 --branch` output.
pub fn parse_status_v2(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();

    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("# branch.head ") {
            if rest != "(detached)" {
                status.branch = Some(rest.to_string());
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("# branch.upstream ") {
            status.upstream = Some(rest.to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("# branch.ab ") {
            // "+<ahead> -<behind>"
            for token in rest.split_whitespace() {
                if let Some(n) = token.strip_prefix('+') {
                    status.ahead = n.parse().unwrap_or(0);
                } else if let Some(n) = token.strip_prefix('-') {
                    status.behind = n.parse().unwrap_or(0);
                }
            }
            continue;
        }
        if line.starts_with('?') {
            status.untracked += 1;
            continue;
        }
        if line.starts_with('u') {
            status.conflicts += 1;
            continue;
        }
        if line.starts_with('1') || line.starts_with('2') {
            status.modified += 1;
        }
    }

    status
}

/// Parse `git for-each-ref --format=...` lines into [`super::BranchInfo`] rows.
///
/// Expected format string: `%(refname:short)\t%(objectname)\t%(upstream:short)\t%(HEAD)\t%(committerdate:iso-strict)`.
pub fn parse_branch_lines(output: &str, current_head: &str) -> Vec<super::BranchInfo> {
    output
        .lines()
        .filter(|l| !l.is_empty())
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.to_string();
            let sha = fields.next()?.to_string();
            let upstream = fields.next().filter(|s| !s.is_empty()).map(str::to_string);
            let head_marker = fields.next().unwrap_or("");
            let updated_at = fields
                .next()
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&chrono::Utc));
            Some(super::BranchInfo {
                is_head: head_marker == "*" || name == current_head,
                name,
                sha,
                upstream,
                ahead: 0,
                behind: 0,
                updated_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_head_and_ahead_behind() {
        let out = "# branch.oid abc123\n# branch.head main\n# branch.upstream origin/main\n# branch.ab +2 -1\n";
        let status = parse_status_v2(out);
        assert_eq!(status.branch.as_deref(), Some("main"));
        assert_eq!(status.upstream.as_deref(), Some("origin/main"));
        assert_eq!(status.ahead, 2);
        assert_eq!(status.behind, 1);
    }

    #[test]
    fn counts_untracked_conflicts_and_modified() {
        let out = "1 .M N... 100644 100644 100644 abc def src/lib.rs\n\
                   ? untracked.txt\n\
                   u UU N... 100644 100644 100644 100644 a b c src/conflict.rs\n";
        let status = parse_status_v2(out);
        assert_eq!(status.modified, 1);
        assert_eq!(status.untracked, 1);
        assert_eq!(status.conflicts, 1);
    }

    #[test]
    fn detached_head_has_no_branch_name() {
        let out = "# branch.head (detached)\n";
        let status = parse_status_v2(out);
        assert_eq!(status.branch, None);
    }

    #[test]
    fn parses_branch_lines_with_head_marker() {
        let out = "main\tabc123\torigin/main\t*\t2026-01-01T00:00:00Z\n\
                    feature\tdef456\t\t\t2026-02-02T00:00:00Z\n";
        let branches = parse_branch_lines(out, "main");
        assert_eq!(branches.len(), 2);
        assert!(branches[0].is_head);
        assert!(!branches[1].is_head);
        assert_eq!(branches[1].upstream, None);
    }
}
