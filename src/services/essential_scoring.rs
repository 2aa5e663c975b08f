// arc2zen essential-tab scoring
// Assigns an essential-tab container whose profile matches no space to the
// space whose name its URLs and titles mention most convincingly.
//
// The weights and threshold are calibrated heuristics, configurable through
// `ExtractorSettings`; they are not a precise rule.

use url::Url;

use crate::types::settings::ExtractorSettings;

/// URL and title of one essential tab, as scored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredTab<'a> {
    pub url: &'a str,
    pub title: &'a str,
}

/// Result of scoring one container against every candidate space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    /// Index into the candidate list, with the winning score.
    Assigned { candidate: usize, score: u32 },
    /// No candidate cleared the threshold, or the best score was tied.
    Unassigned { best: u32 },
}

pub struct EssentialScorer<'a> {
    settings: &'a ExtractorSettings,
}

impl<'a> EssentialScorer<'a> {
    pub fn new(settings: &'a ExtractorSettings) -> Self {
        Self { settings }
    }

    /// Whether a space name takes part in scoring at all.
    pub fn is_eligible(&self, space_name: &str) -> bool {
        let normalized = normalize(space_name);
        if normalized.chars().count() < self.settings.min_space_name_len {
            return false;
        }
        !self
            .settings
            .heuristic_excluded_spaces
            .iter()
            .any(|excluded| normalize(excluded) == normalized)
    }

    /// Sums per-tab contributions: strong match, else loose match, else nothing.
    pub fn score(&self, space_name: &str, tabs: &[ScoredTab<'_>]) -> u32 {
        if !self.is_eligible(space_name) {
            return 0;
        }
        let name = normalize(space_name);
        tabs.iter()
            .map(|tab| {
                if is_strong_match(&name, tab.url) {
                    self.settings.strong_match_weight
                } else if is_loose_match(&name, tab) {
                    self.settings.loose_match_weight
                } else {
                    0
                }
            })
            .sum()
    }

    /// Picks the single best candidate, if it is unambiguous and strong enough.
    pub fn assign(&self, candidates: &[&str], tabs: &[ScoredTab<'_>]) -> ScoreOutcome {
        let scores: Vec<u32> = candidates.iter().map(|name| self.score(name, tabs)).collect();
        let best = scores.iter().copied().max().unwrap_or(0);
        if best < self.settings.min_score || best == 0 {
            return ScoreOutcome::Unassigned { best };
        }
        let mut winners = scores.iter().enumerate().filter(|(_, s)| **s == best);
        match (winners.next(), winners.next()) {
            (Some((candidate, _)), None) => ScoreOutcome::Assigned { candidate, score: best },
            _ => ScoreOutcome::Unassigned { best },
        }
    }
}

/// Lowercased with whitespace removed, so "Acme Labs" compares as "acmelabs".
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_strong_match(name: &str, raw_url: &str) -> bool {
    let lower = raw_url.to_lowercase();
    if lower.contains(&format!("@{}.", name)) {
        return true;
    }
    let Ok(parsed) = Url::parse(&lower) else {
        return false;
    };

    if let Some(host) = parsed.host_str() {
        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
        if labels.iter().any(|label| *label == name) {
            return true;
        }
        if labels.len() >= 2 {
            let registrable = labels[labels.len() - 2..].join(".");
            if registrable == name {
                return true;
            }
        }
    }

    parsed
        .path_segments()
        .map(|mut segments| segments.any(|segment| segment == name))
        .unwrap_or(false)
}

fn is_loose_match(name: &str, tab: &ScoredTab<'_>) -> bool {
    tab.url.to_lowercase().contains(name) || normalize(tab.title).contains(name)
}
