// tests/matcher.rs

use std::path::Path;

use proptest::prelude::*;

use sitepipe::errors::PipelineError;
use sitepipe::matcher::{match_files, FileSet};
use sitepipe::paths::relative_slash;
use sitepipe_test_utils::fixture::SiteFixture;

/// a/1.txt, a/2.txt, a/deep/3.txt, b.txt, x.css, y.js, z.html
fn tree() -> SiteFixture {
    let site = SiteFixture::empty();
    for rel in [
        "a/2.txt",
        "a/1.txt",
        "a/deep/3.txt",
        "b.txt",
        "x.css",
        "y.js",
        "z.html",
    ] {
        site.write(rel, rel);
    }
    site
}

fn rels(set: &FileSet, root: &Path) -> Vec<String> {
    let root = root.canonicalize().unwrap();
    set.iter()
        .map(|p| relative_slash(&root, p).unwrap())
        .collect()
}

fn matched(site: &SiteFixture, patterns: &[&str]) -> Vec<String> {
    let set = match_files(patterns, site.root()).unwrap();
    rels(&set, site.root())
}

#[test]
fn patterns_are_evaluated_in_declaration_order() {
    let site = tree();
    assert_eq!(
        matched(&site, &["b.txt", "a/*.txt"]),
        vec!["b.txt", "a/1.txt", "a/2.txt"]
    );
}

#[test]
fn single_star_does_not_cross_directories() {
    let site = tree();
    assert_eq!(matched(&site, &["*.txt"]), vec!["b.txt"]);
    assert_eq!(matched(&site, &["a/*.txt"]), vec!["a/1.txt", "a/2.txt"]);
}

#[test]
fn double_star_spans_any_depth() {
    let site = tree();
    assert_eq!(
        matched(&site, &["**/*.txt"]),
        vec!["a/1.txt", "a/2.txt", "a/deep/3.txt", "b.txt"]
    );
    assert_eq!(matched(&site, &["a/**/*.txt"]), vec!["a/1.txt", "a/2.txt", "a/deep/3.txt"]);
}

#[test]
fn brace_alternation_matches_each_branch() {
    let site = tree();
    assert_eq!(matched(&site, &["*.{css,js}"]), vec!["x.css", "y.js"]);
}

#[test]
fn negations_apply_regardless_of_position() {
    let site = tree();
    let expected = vec!["a/1.txt", "a/deep/3.txt", "b.txt"];
    assert_eq!(matched(&site, &["**/*.txt", "!a/2.txt"]), expected);
    assert_eq!(matched(&site, &["!a/2.txt", "**/*.txt"]), expected);
}

#[test]
fn first_occurrence_wins_across_patterns() {
    let site = tree();
    assert_eq!(
        matched(&site, &["a/2.txt", "a/*.txt", "a/2.txt"]),
        vec!["a/2.txt", "a/1.txt"]
    );
}

#[test]
fn leading_dot_slash_is_ignored() {
    let site = tree();
    assert_eq!(matched(&site, &["./b.txt"]), vec!["b.txt"]);
}

#[test]
fn missing_files_and_roots_give_empty_sets() {
    let site = tree();
    assert!(matched(&site, &["nope/**/*.txt", "missing.txt"]).is_empty());

    let gone = site.path("does-not-exist");
    let set = match_files(&["**/*"], &gone).unwrap();
    assert!(set.is_empty());
}

#[test]
fn invalid_glob_is_a_match_error() {
    let site = tree();
    let err = match_files(&["a/[b"], site.root()).unwrap_err();
    match err {
        PipelineError::MatchError { pattern, .. } => assert_eq!(pattern, "a/[b"),
        other => panic!("expected MatchError, got {other:?}"),
    }
}

#[test]
fn file_set_push_rejects_duplicates() {
    let mut set = FileSet::new();
    assert!(set.push("/x/a".into()));
    assert!(!set.push("/x/a".into()));
    assert!(set.push("/x/b".into()));
    assert_eq!(set.len(), 2);
    assert!(set.contains(Path::new("/x/b")));
}

const POOL: &[&str] = &[
    "**/*.txt",
    "a/*.txt",
    "*.txt",
    "b.txt",
    "a/deep/3.txt",
    "*.{css,js,html}",
    "**/*",
    "z.html",
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn combined_match_is_ordered_union_of_single_matches(
        picks in proptest::collection::vec(0..POOL.len(), 1..5)
    ) {
        let site = tree();
        let patterns: Vec<&str> = picks.iter().map(|&i| POOL[i]).collect();

        let combined = matched(&site, &patterns);

        let mut expected: Vec<String> = Vec::new();
        for pattern in &patterns {
            for rel in matched(&site, &[*pattern]) {
                if !expected.contains(&rel) {
                    expected.push(rel);
                }
            }
        }

        prop_assert_eq!(combined, expected);
    }
}
