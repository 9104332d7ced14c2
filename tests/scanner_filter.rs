//! Scenario 1 (spec §8): scanner include/exclude/max_depth filtering.

mod common;

use gzr::model::RepoFilter;
use gzr::scanner;

#[test]
fn finds_only_included_non_excluded_repos_within_depth() {
    let tmp = tempfile::tempdir().unwrap();
    common::make_bare_repo_marker(tmp.path(), "a/r1");
    common::make_bare_repo_marker(tmp.path(), "a/r2");
    common::make_bare_repo_marker(tmp.path(), "b/r1");
    common::make_bare_repo_marker(tmp.path(), "c/tmp");

    let filter = RepoFilter {
        include: Some(regex::Regex::new("^a/").unwrap()),
        exclude: Some(regex::Regex::new(".*tmp$").unwrap()),
        max_depth: 2,
        include_submodules: false,
    };

    let found = scanner::scan(tmp.path(), &filter).unwrap();
    let rel: Vec<String> = found
        .iter()
        .map(|r| r.relative_to(tmp.path()).to_string_lossy().into_owned())
        .collect();

    assert_eq!(rel, vec!["a/r1".to_string(), "a/r2".to_string()]);
}
