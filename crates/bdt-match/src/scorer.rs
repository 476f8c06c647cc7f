//! Weighted heuristic scoring of one company against one business need.

use bdt_core::{BudgetRange, BusinessNeed, Company, CompanySize, LookingFor, Sector};
use serde::Serialize;

use crate::affinity::SectorAffinityTable;

const EXACT_SECTOR: f64 = 1.0;
const RELATED_SECTOR: f64 = 0.7;
const COMPLEMENTARY_SECTOR: f64 = 0.5;

const KEYWORD_STEP: f64 = 0.2;
const KEYWORD_CAP: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub sector: f64,
    pub looking_for: f64,
    pub budget_size: f64,
    pub keyword: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            sector: 0.40,
            looking_for: 0.30,
            budget_size: 0.15,
            keyword: 0.15,
        }
    }
}

/// One factor's contribution before weighting.
#[derive(Debug, Clone, PartialEq)]
pub struct SubScore {
    pub value: f64,
    pub reason: Option<String>,
}

impl SubScore {
    pub fn zero() -> Self {
        Self {
            value: 0.0,
            reason: None,
        }
    }

    pub fn new(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchScore {
    pub score: f64,
    pub reasons: Vec<String>,
}

pub trait Scorer {
    fn score(&self, need: &BusinessNeed, company: &Company) -> MatchScore;
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    table: SectorAffinityTable,
    weights: MatchWeights,
}

impl Scorer for HeuristicScorer {
    fn score(&self, need: &BusinessNeed, company: &Company) -> MatchScore {
        let parts = [
            (
                self.sector_affinity(&need.target_sectors, company.sector()),
                self.weights.sector,
            ),
            (
                self.looking_for_affinity(need.role(), company),
                self.weights.looking_for,
            ),
            (
                Self::budget_size_affinity(need.budget_range, company.size),
                self.weights.budget_size,
            ),
            (
                Self::keyword_affinity(&need.description, &company.tags),
                self.weights.keyword,
            ),
        ];

        let mut score = 0.0;
        let mut reasons = Vec::new();
        for (part, weight) in parts {
            score += part.value * weight;
            if let Some(reason) = part.reason {
                reasons.push(reason);
            }
        }

        MatchScore {
            score: score.min(1.0),
            reasons,
        }
    }
}

impl HeuristicScorer {
    pub fn new(table: SectorAffinityTable, weights: MatchWeights) -> Self {
        Self { table, weights }
    }

    pub fn table(&self) -> &SectorAffinityTable {
        &self.table
    }

    pub fn weights(&self) -> MatchWeights {
        self.weights
    }

    /// Exact membership wins outright; otherwise the first target (in the
    /// need's order) declaring the company sector as related, then the first
    /// declaring it complementary.
    pub fn sector_affinity(&self, targets: &[Sector], company_sector: Option<&Sector>) -> SubScore {
        let Some(company_sector) = company_sector else {
            return SubScore::zero();
        };
        if targets.is_empty() {
            return SubScore::zero();
        }

        if targets.contains(company_sector) {
            return SubScore::new(
                EXACT_SECTOR,
                format!("Exact sector match ({company_sector})"),
            );
        }

        if let Some(target) = targets
            .iter()
            .find(|t| self.table.is_related(t, company_sector))
        {
            return SubScore::new(
                RELATED_SECTOR,
                format!("Related sector ({company_sector} ↔ {target})"),
            );
        }

        if let Some(target) = targets
            .iter()
            .find(|t| self.table.is_complementary(t, company_sector))
        {
            return SubScore::new(
                COMPLEMENTARY_SECTOR,
                format!("Complementary sector ({company_sector} ↔ {target})"),
            );
        }

        SubScore::zero()
    }

    /// Walks the role's rule ladder and returns the first rung that applies.
    pub fn looking_for_affinity(&self, role: Option<&LookingFor>, company: &Company) -> SubScore {
        let ladder: &[Rung] = match role {
            Some(LookingFor::Investor) => INVESTOR_LADDER,
            Some(LookingFor::Customer) => CUSTOMER_LADDER,
            Some(LookingFor::Supplier) => SUPPLIER_LADDER,
            Some(LookingFor::Partner) => PARTNER_LADDER,
            Some(LookingFor::ServiceProvider | LookingFor::Mentor | LookingFor::Other(_)) | None => {
                &[]
            }
        };

        ladder
            .iter()
            .find(|rung| (rung.applies)(company))
            .map(|rung| SubScore::new(rung.score, rung.reason))
            .unwrap_or_else(SubScore::zero)
    }

    /// Larger budgets pair with larger companies. Only the top two bands
    /// count; a closeness of 0.4 or less is dropped entirely.
    pub fn budget_size_affinity(
        budget: Option<BudgetRange>,
        size: Option<CompanySize>,
    ) -> SubScore {
        let (Some(budget), Some(size)) = (budget, size) else {
            return SubScore::zero();
        };
        let raw = (1.0 - (budget_score(budget) - size_score(size)).abs()).max(0.0);
        budget_size_band(raw, budget, size)
    }

    /// Each tag found (case-insensitively) in the description adds 0.2, up to 0.8.
    pub fn keyword_affinity(description: &str, tags: &[String]) -> SubScore {
        if description.is_empty() || tags.is_empty() {
            return SubScore::zero();
        }

        let haystack = description.to_lowercase();
        let matched: Vec<&str> = tags
            .iter()
            .filter(|tag| haystack.contains(&tag.to_lowercase()))
            .map(String::as_str)
            .collect();

        if matched.is_empty() {
            return SubScore::zero();
        }

        let value = (matched.len() as f64 * KEYWORD_STEP).min(KEYWORD_CAP);
        SubScore::new(value, format!("Keyword match: {}", matched.join(", ")))
    }

    /// Human-readable breakdown of a single pairing.
    pub fn explain(&self, need: &BusinessNeed, company: &Company) -> String {
        let MatchScore { score, reasons } = self.score(need, company);
        let mut out = format!("Match Score: {:.1}%\n\nMatching Factors:\n", score * 100.0);
        if reasons.is_empty() {
            out.push_str("• No significant matching factors found\n");
        }
        for reason in reasons {
            out.push_str(&format!("• {reason}\n"));
        }
        out
    }
}

pub fn budget_score(budget: BudgetRange) -> f64 {
    match budget {
        BudgetRange::UpTo10K => 0.2,
        BudgetRange::From10KTo50K => 0.4,
        BudgetRange::From50KTo100K => 0.6,
        BudgetRange::From100KTo500K => 0.8,
        BudgetRange::Over500K => 1.0,
    }
}

pub fn size_score(size: CompanySize) -> f64 {
    match size {
        CompanySize::Micro => 0.2,
        CompanySize::Small => 0.4,
        CompanySize::Medium => 0.6,
        CompanySize::Large => 0.8,
        CompanySize::Enterprise => 1.0,
    }
}

/// Maps a raw budget/size closeness onto its reported band.
pub fn budget_size_band(raw: f64, budget: BudgetRange, size: CompanySize) -> SubScore {
    if raw > 0.7 {
        SubScore::new(raw, format!("Good budget-size match ({budget} ↔ {size})"))
    } else if raw > 0.4 {
        SubScore::new(raw, "Moderate budget-size match")
    } else {
        SubScore::zero()
    }
}

struct Rung {
    applies: fn(&Company) -> bool,
    score: f64,
    reason: &'static str,
}

const INVESTOR_LADDER: &[Rung] = &[
    Rung {
        applies: sector_mentions_finance,
        score: 0.8,
        reason: "Financial sector company (potential investor)",
    },
    Rung {
        applies: has_investment_tag,
        score: 0.9,
        reason: "Investment-related tags",
    },
    Rung {
        applies: is_large_or_enterprise,
        score: 0.5,
        reason: "Large company (potential corporate investor)",
    },
];

const CUSTOMER_LADDER: &[Rung] = &[
    Rung {
        applies: is_medium_or_bigger,
        score: 0.7,
        reason: "Good size for potential customer",
    },
    Rung {
        applies: has_b2b_tag,
        score: 0.6,
        reason: "B2B company (potential customer)",
    },
];

const SUPPLIER_LADDER: &[Rung] = &[
    Rung {
        applies: sector_mentions_manufacturing,
        score: 0.8,
        reason: "Manufacturing sector (potential supplier)",
    },
    Rung {
        applies: has_supplier_tag,
        score: 0.7,
        reason: "Supplier-related characteristics",
    },
];

const PARTNER_LADDER: &[Rung] = &[
    Rung {
        applies: is_small_or_medium,
        score: 0.6,
        reason: "Similar size for partnership",
    },
    Rung {
        applies: has_innovation_tag,
        score: 0.7,
        reason: "Innovation-focused (good partner)",
    },
];

fn sector_mentions(company: &Company, needle: &str) -> bool {
    company
        .sector()
        .is_some_and(|s| s.as_str().to_lowercase().contains(needle))
}

fn has_any_tag(company: &Company, wanted: &[&str]) -> bool {
    company.tags.iter().any(|tag| wanted.contains(&tag.as_str()))
}

fn size_in(company: &Company, sizes: &[CompanySize]) -> bool {
    company.size.is_some_and(|size| sizes.contains(&size))
}

fn sector_mentions_finance(company: &Company) -> bool {
    sector_mentions(company, "finance")
}

fn sector_mentions_manufacturing(company: &Company) -> bool {
    sector_mentions(company, "manufacturing")
}

fn has_investment_tag(company: &Company) -> bool {
    has_any_tag(company, &["investment", "fund", "venture", "capital"])
}

fn has_b2b_tag(company: &Company) -> bool {
    has_any_tag(company, &["b2b"])
}

fn has_supplier_tag(company: &Company) -> bool {
    has_any_tag(company, &["supplier", "manufacturing", "b2b"])
}

fn has_innovation_tag(company: &Company) -> bool {
    has_any_tag(company, &["startup", "innovation", "tech"])
}

fn is_large_or_enterprise(company: &Company) -> bool {
    size_in(company, &[CompanySize::Large, CompanySize::Enterprise])
}

fn is_medium_or_bigger(company: &Company) -> bool {
    size_in(
        company,
        &[CompanySize::Medium, CompanySize::Large, CompanySize::Enterprise],
    )
}

fn is_small_or_medium(company: &Company) -> bool {
    size_in(company, &[CompanySize::Small, CompanySize::Medium])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bdt_core::NeedType;

    fn need() -> BusinessNeed {
        BusinessNeed::new("Owner Co", "Find someone", NeedType::PreSaleAction)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn exact_sector_dominates_related_and_complementary() {
        let scorer = HeuristicScorer::default();
        // Finance is also related to Technology, but it is listed as a target itself.
        let sub = scorer.sector_affinity(
            &[Sector::Technology, Sector::Finance],
            Some(&Sector::Finance),
        );
        assert_eq!(sub.value, 1.0);
        assert_eq!(sub.reason.as_deref(), Some("Exact sector match (Finance)"));
    }

    #[test]
    fn related_beats_complementary_across_targets() {
        let scorer = HeuristicScorer::default();
        // Healthcare: Finance is complementary. Real Estate: Finance is related.
        let sub = scorer.sector_affinity(
            &[Sector::Healthcare, Sector::RealEstate],
            Some(&Sector::Finance),
        );
        assert_eq!(sub.value, 0.7);
        assert_eq!(
            sub.reason.as_deref(),
            Some("Related sector (Finance ↔ Real Estate)")
        );
    }

    #[test]
    fn sector_affinity_degrades_to_zero() {
        let scorer = HeuristicScorer::default();
        assert_eq!(scorer.sector_affinity(&[], Some(&Sector::Finance)), SubScore::zero());
        assert_eq!(scorer.sector_affinity(&[Sector::Finance], None), SubScore::zero());
        assert_eq!(
            scorer.sector_affinity(&[Sector::Finance], Some(&Sector::Other("Mining".into()))),
            SubScore::zero()
        );
    }

    #[test]
    fn investor_ladder_stops_at_first_rung() {
        let scorer = HeuristicScorer::default();
        let company = Company::new("Fund")
            .with_sector(Sector::Finance)
            .with_size(CompanySize::Enterprise)
            .with_tags(["fund"]);
        let sub = scorer.looking_for_affinity(Some(&LookingFor::Investor), &company);
        assert_eq!(sub.value, 0.8);

        let tagged = Company::new("Angels").with_tags(["venture"]);
        let sub = scorer.looking_for_affinity(Some(&LookingFor::Investor), &tagged);
        assert_eq!(sub.value, 0.9);
        assert_eq!(sub.reason.as_deref(), Some("Investment-related tags"));
    }

    #[test]
    fn roles_without_ladder_score_zero() {
        let scorer = HeuristicScorer::default();
        let company = Company::new("Big")
            .with_size(CompanySize::Enterprise)
            .with_tags(["b2b", "startup"]);
        for role in [
            LookingFor::ServiceProvider,
            LookingFor::Mentor,
            LookingFor::Other("Other".into()),
        ] {
            assert_eq!(scorer.looking_for_affinity(Some(&role), &company), SubScore::zero());
        }
        assert_eq!(scorer.looking_for_affinity(None, &company), SubScore::zero());
    }

    #[test]
    fn partner_and_supplier_ladders() {
        let scorer = HeuristicScorer::default();
        let startup = Company::new("Tiny").with_size(CompanySize::Micro).with_tags(["tech"]);
        let sub = scorer.looking_for_affinity(Some(&LookingFor::Partner), &startup);
        assert_eq!(sub.value, 0.7);

        let plant = Company::new("Plant").with_sector(Sector::Manufacturing);
        let sub = scorer.looking_for_affinity(Some(&LookingFor::Supplier), &plant);
        assert_eq!(sub.value, 0.8);

        let reseller = Company::new("Reseller").with_size(CompanySize::Small).with_tags(["b2b"]);
        let sub = scorer.looking_for_affinity(Some(&LookingFor::Customer), &reseller);
        assert_eq!(sub.reason.as_deref(), Some("B2B company (potential customer)"));
    }

    #[test]
    fn budget_size_bands() {
        let good = HeuristicScorer::budget_size_affinity(
            Some(BudgetRange::Over500K),
            Some(CompanySize::Large),
        );
        assert!(approx(good.value, 0.8));
        assert_eq!(
            good.reason.as_deref(),
            Some("Good budget-size match ($500K+ ↔ 201-1000)")
        );

        let moderate = HeuristicScorer::budget_size_affinity(
            Some(BudgetRange::Over500K),
            Some(CompanySize::Medium),
        );
        assert!(approx(moderate.value, 0.6));
        assert_eq!(moderate.reason.as_deref(), Some("Moderate budget-size match"));

        // 1 - |1.0 - 0.4| = 0.4 is discarded even though it is non-zero.
        let weak = HeuristicScorer::budget_size_affinity(
            Some(BudgetRange::Over500K),
            Some(CompanySize::Small),
        );
        assert_eq!(weak, SubScore::zero());

        assert_eq!(
            HeuristicScorer::budget_size_affinity(None, Some(CompanySize::Small)),
            SubScore::zero()
        );
    }

    #[test]
    fn band_edges() {
        let band = |raw| budget_size_band(raw, BudgetRange::UpTo10K, CompanySize::Micro);
        assert_eq!(band(0.4), SubScore::zero());
        assert_eq!(band(0.3), SubScore::zero());
        assert_eq!(band(0.7).reason.as_deref(), Some("Moderate budget-size match"));
        assert!(band(0.71).reason.unwrap().starts_with("Good budget-size match"));
    }

    #[test]
    fn keyword_affinity_keeps_tag_order_and_casing() {
        let tags: Vec<String> = ["SaaS", "ai", "green", "B2B", "api", "cloud"]
            .into_iter()
            .map(String::from)
            .collect();
        let sub = HeuristicScorer::keyword_affinity("Need B2B SaaS with AI and an API in the cloud", &tags);
        assert_eq!(sub.value, 0.8);
        assert_eq!(
            sub.reason.as_deref(),
            Some("Keyword match: SaaS, ai, B2B, api, cloud")
        );

        let one = HeuristicScorer::keyword_affinity("green energy", &tags);
        assert!(approx(one.value, 0.2));
        assert_eq!(HeuristicScorer::keyword_affinity("", &tags), SubScore::zero());
        assert_eq!(HeuristicScorer::keyword_affinity("anything", &[]), SubScore::zero());
    }

    #[test]
    fn score_is_bounded_and_reasons_follow_factor_order() {
        let scorer = HeuristicScorer::default();
        let need = need()
            .looking_for("investor")
            .with_target_sectors(["Finance"])
            .with_budget(BudgetRange::Over500K)
            .with_description("fund investment venture capital");
        let company = Company::new("Max")
            .with_sector(Sector::Finance)
            .with_size(CompanySize::Enterprise)
            .with_tags(["fund", "investment", "venture", "capital"]);

        let result = scorer.score(&need, &company);
        assert!(result.score <= 1.0);
        assert!(approx(result.score, 0.4 + 0.24 + 0.15 + 0.12));
        assert_eq!(result.reasons.len(), 4);
        assert!(result.reasons[0].starts_with("Exact sector match"));
        assert!(result.reasons[3].starts_with("Keyword match"));
    }

    #[test]
    fn oversized_weights_are_clamped() {
        let scorer = HeuristicScorer::new(
            SectorAffinityTable::builtin(),
            MatchWeights {
                sector: 2.0,
                ..MatchWeights::default()
            },
        );
        let need = need().with_target_sectors(["Retail"]);
        let company = Company::new("Shop").with_sector(Sector::Retail);
        assert_eq!(scorer.score(&need, &company).score, 1.0);
    }

    #[test]
    fn empty_records_score_zero() {
        let scorer = HeuristicScorer::default();
        let result = scorer.score(&need(), &Company::new("Empty"));
        assert_eq!(result.score, 0.0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn explanation_lists_factors() {
        let scorer = HeuristicScorer::default();
        let need = need().with_target_sectors(["Retail"]);
        let company = Company::new("Shop").with_sector(Sector::Retail);
        let text = scorer.explain(&need, &company);
        assert!(text.starts_with("Match Score: 40.0%"));
        assert!(text.contains("• Exact sector match (Retail)"));

        let empty = scorer.explain(&need, &Company::new("Nothing"));
        assert!(empty.contains("No significant matching factors found"));
    }
}
