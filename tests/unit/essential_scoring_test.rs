//! Unit tests for essential-tab scoring.
//!
//! Table-driven checks of strong/loose matches, eligibility, thresholds and ties.

use arc2zen::services::essential_scoring::{EssentialScorer, ScoreOutcome, ScoredTab};
use arc2zen::types::settings::ExtractorSettings;
use rstest::rstest;

fn tabs<'a>(pairs: &'a [(&'a str, &'a str)]) -> Vec<ScoredTab<'a>> {
    pairs
        .iter()
        .map(|&(url, title)| ScoredTab { url, title })
        .collect()
}

#[rstest]
#[case::host_label("acme", "https://acme.example.com/", "Home", 3)]
#[case::registrable_host("acme.io", "https://app.acme.io/", "Home", 3)]
#[case::path_segment("finance", "https://intranet.test/finance/q3", "Report", 3)]
#[case::email("acme", "https://mail.test/?u=jo@acme.com", "Inbox", 3)]
#[case::url_substring("acme", "https://acmecorp.test/", "Home", 1)]
#[case::title_substring("acme", "https://portal.test/", "Acme Portal", 1)]
#[case::no_match("acme", "https://news.test/", "News", 0)]
fn test_single_tab_score(
    #[case] space: &str,
    #[case] url: &str,
    #[case] title: &str,
    #[case] expected: u32,
) {
    let settings = ExtractorSettings::default();
    let scorer = EssentialScorer::new(&settings);
    let pairs = [(url, title)];
    assert_eq!(scorer.score(space, &tabs(&pairs)), expected);
}

#[rstest]
#[case::too_short("Me", false)]
#[case::long_enough("Work", true)]
#[case::whitespace_ignored(" a b ", false)]
fn test_eligibility_by_length(#[case] name: &str, #[case] eligible: bool) {
    let settings = ExtractorSettings::default();
    assert_eq!(EssentialScorer::new(&settings).is_eligible(name), eligible);
}

#[test]
fn test_excluded_spaces_never_score() {
    let settings = ExtractorSettings {
        heuristic_excluded_spaces: vec!["work".to_string()],
        ..ExtractorSettings::default()
    };
    let scorer = EssentialScorer::new(&settings);
    let pairs = [("https://work.test/", "Work")];
    assert!(!scorer.is_eligible("Work"));
    assert_eq!(scorer.score("Work", &tabs(&pairs)), 0);
}

#[test]
fn test_multi_word_names_are_normalized() {
    let settings = ExtractorSettings::default();
    let scorer = EssentialScorer::new(&settings);
    let pairs = [("https://acmelabs.test/", "Dashboard")];
    assert_eq!(scorer.score("Acme Labs", &tabs(&pairs)), 3);
}

#[test]
fn test_assign_picks_unique_best_above_threshold() {
    let settings = ExtractorSettings::default();
    let scorer = EssentialScorer::new(&settings);
    let pairs = [
        ("https://acme.test/", "Home"),
        ("https://jira.test/acme", "Board"),
        ("https://news.test/", "News"),
    ];
    let outcome = scorer.assign(&["Personal", "Acme"], &tabs(&pairs));
    assert_eq!(outcome, ScoreOutcome::Assigned { candidate: 1, score: 6 });
}

#[test]
fn test_assign_below_threshold_stays_unassigned() {
    let settings = ExtractorSettings::default();
    let scorer = EssentialScorer::new(&settings);
    let pairs = [("https://acme.test/", "Home")];
    assert_eq!(
        scorer.assign(&["Acme"], &tabs(&pairs)),
        ScoreOutcome::Unassigned { best: 3 }
    );
}

#[test]
fn test_assign_tie_stays_unassigned() {
    let settings = ExtractorSettings::default();
    let scorer = EssentialScorer::new(&settings);
    let pairs = [("https://acme.test/", "Home"), ("https://beta.test/", "Home")];
    let lowered = ExtractorSettings {
        min_score: 3,
        ..ExtractorSettings::default()
    };
    let lenient = EssentialScorer::new(&lowered);
    assert_eq!(
        lenient.assign(&["Acme", "Beta"], &tabs(&pairs)),
        ScoreOutcome::Unassigned { best: 3 }
    );
    assert_eq!(
        scorer.assign(&["Acme", "Beta"], &tabs(&pairs)),
        ScoreOutcome::Unassigned { best: 3 }
    );
}

#[test]
fn test_weights_are_configurable() {
    let settings = ExtractorSettings {
        strong_match_weight: 5,
        loose_match_weight: 2,
        min_score: 5,
        ..ExtractorSettings::default()
    };
    let scorer = EssentialScorer::new(&settings);
    let pairs = [("https://acme.test/", "Home"), ("https://x.test/", "Acme docs")];
    assert_eq!(scorer.score("Acme", &tabs(&pairs)), 7);
    assert_eq!(
        scorer.assign(&["Acme"], &tabs(&pairs)),
        ScoreOutcome::Assigned { candidate: 0, score: 7 }
    );
}
