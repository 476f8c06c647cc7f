//! Ranks a candidate catalog against a business need.

use bdt_core::{BusinessNeed, Company};
use serde::Serialize;
use tracing::debug;

use crate::affinity::SectorAffinityTable;
use crate::scorer::{HeuristicScorer, MatchWeights, Scorer};

/// A scored pairing, produced per query and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub company: Company,
    pub score: f64,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    /// Matches must score strictly above this.
    pub min_score: f64,
    pub max_results: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            min_score: 0.3,
            max_results: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchRanker<S = HeuristicScorer> {
    scorer: S,
    config: RankerConfig,
}

impl Default for MatchRanker<HeuristicScorer> {
    fn default() -> Self {
        Self::new(HeuristicScorer::default(), RankerConfig::default())
    }
}

impl MatchRanker<HeuristicScorer> {
    pub fn with_table(table: SectorAffinityTable) -> Self {
        Self::new(
            HeuristicScorer::new(table, MatchWeights::default()),
            RankerConfig::default(),
        )
    }
}

impl<S: Scorer> MatchRanker<S> {
    pub fn new(scorer: S, config: RankerConfig) -> Self {
        Self { scorer, config }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn config(&self) -> RankerConfig {
        self.config
    }

    /// Scores every company except the need's owner, keeps those above the
    /// threshold, and returns the best `max_results`. Equal scores keep the
    /// catalog order.
    pub fn find_matches(&self, need: &BusinessNeed, companies: &[Company]) -> Vec<Match> {
        let mut matches: Vec<Match> = companies
            .iter()
            .filter(|company| company.name != need.company_name)
            .filter_map(|company| {
                let scored = self.scorer.score(need, company);
                (scored.score > self.config.min_score).then(|| Match {
                    company: company.clone(),
                    score: scored.score,
                    reasons: scored.reasons,
                })
            })
            .collect();

        let above_threshold = matches.len();
        // `sort_by` is stable, which is what keeps ties in catalog order.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(self.config.max_results);

        debug!(
            need_id = %need.id,
            candidates = companies.len(),
            above_threshold,
            returned = matches.len(),
            "ranked matches"
        );
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::MatchScore;
    use bdt_core::NeedType;
    use std::collections::HashMap;

    /// Scores companies from a fixed lookup by name.
    struct FixedScorer(HashMap<String, f64>);

    impl Scorer for FixedScorer {
        fn score(&self, _need: &BusinessNeed, company: &Company) -> MatchScore {
            MatchScore {
                score: self.0.get(&company.name).copied().unwrap_or(0.0),
                reasons: vec![format!("fixed score for {}", company.name)],
            }
        }
    }

    fn ranker(scores: &[(&str, f64)]) -> MatchRanker<FixedScorer> {
        let table = scores
            .iter()
            .map(|(name, score)| (name.to_string(), *score))
            .collect();
        MatchRanker::new(FixedScorer(table), RankerConfig::default())
    }

    fn need() -> BusinessNeed {
        BusinessNeed::new("Owner", "Need", NeedType::PreSaleAction)
    }

    fn companies(names: &[&str]) -> Vec<Company> {
        names.iter().map(|n| Company::new(*n)).collect()
    }

    #[test]
    fn threshold_is_strict() {
        let ranker = ranker(&[("At", 0.30), ("Above", 0.31), ("Below", 0.29)]);
        let matches = ranker.find_matches(&need(), &companies(&["At", "Above", "Below"]));
        let names: Vec<_> = matches.iter().map(|m| m.company.name.as_str()).collect();
        assert_eq!(names, vec!["Above"]);
    }

    #[test]
    fn owner_is_never_matched() {
        let ranker = ranker(&[("Owner", 0.99), ("Other", 0.5)]);
        let matches = ranker.find_matches(&need(), &companies(&["Owner", "Other"]));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].company.name, "Other");
    }

    #[test]
    fn result_is_capped_at_ten() {
        let names: Vec<String> = (0..15).map(|i| format!("C{i}")).collect();
        let scores: Vec<(&str, f64)> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), 0.4 + i as f64 * 0.01))
            .collect();
        let ranker = ranker(&scores);
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let matches = ranker.find_matches(&need(), &companies(&refs));
        assert_eq!(matches.len(), 10);
        assert_eq!(matches[0].company.name, "C14");
        assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_catalog_order() {
        let ranker = ranker(&[("B", 0.5), ("A", 0.5), ("Top", 0.9), ("C", 0.5)]);
        let matches = ranker.find_matches(&need(), &companies(&["B", "A", "Top", "C"]));
        let names: Vec<_> = matches.iter().map(|m| m.company.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "B", "A", "C"]);
    }

    #[test]
    fn empty_catalog_yields_no_matches() {
        let ranker = MatchRanker::default();
        assert!(ranker.find_matches(&need(), &[]).is_empty());
        assert!(ranker
            .find_matches(&need(), &companies(&["Nothing", "In", "Common"]))
            .is_empty());
    }
}
