use bdt_core::{BudgetRange, BusinessNeed, Company, CompanySize, NeedType, Sector};
use bdt_match::{HeuristicScorer, MatchRanker, Scorer};

fn series_a_need() -> BusinessNeed {
    BusinessNeed::new(
        "TechStart Inc.",
        "Seeking Series A Investment",
        NeedType::SignificantBusinessEvent,
    )
    .looking_for("Investor")
    .with_target_sectors(["Technology"])
    .with_budget(BudgetRange::Over500K)
    .with_description("seeking ai saas expertise")
}

#[test]
fn investor_need_against_finance_company() {
    let company = Company::new("FinanceFlow")
        .with_sector(Sector::Finance)
        .with_size(CompanySize::Large)
        .with_tags(["investment", "fund"]);

    let scored = HeuristicScorer::default().score(&series_a_need(), &company);

    // Technology declares Finance as related (0.7 * 0.4), a Finance sector hits
    // the first investor rung (0.8 * 0.3), $500K+ vs 201-1000 is a good fit
    // (0.8 * 0.15), and neither tag appears in the description.
    assert!((scored.score - 0.64).abs() < 1e-9, "score was {}", scored.score);
    assert_eq!(
        scored.reasons,
        vec![
            "Related sector (Finance ↔ Technology)".to_string(),
            "Financial sector company (potential investor)".to_string(),
            "Good budget-size match ($500K+ ↔ 201-1000)".to_string(),
        ]
    );
}

#[test]
fn ranking_over_a_small_catalog() {
    let catalog = vec![
        Company::new("TechStart Inc.")
            .with_sector(Sector::Technology)
            .with_size(CompanySize::Small)
            .with_tags(["startup", "b2b", "saas", "ai"]),
        Company::new("GreenEnergy Solutions")
            .with_sector(Sector::Manufacturing)
            .with_size(CompanySize::Medium)
            .with_tags(["green", "renewable", "manufacturing"]),
        Company::new("FinanceFlow")
            .with_sector(Sector::Finance)
            .with_size(CompanySize::Large)
            .with_tags(["fintech", "banking", "payments"]),
        Company::new("VentureCapital Partners")
            .with_sector(Sector::Finance)
            .with_size(CompanySize::Large)
            .with_tags(["investment", "fund", "venture", "capital"]),
        Company::new("Corner Bakery")
            .with_sector(Sector::Other("Food".into()))
            .with_size(CompanySize::Micro),
    ];

    let matches = MatchRanker::default().find_matches(&series_a_need(), &catalog);
    let names: Vec<_> = matches.iter().map(|m| m.company.name.as_str()).collect();

    // The two finance firms tie and keep catalog order; the owner and the
    // unrelated bakery are left out.
    assert_eq!(names[..2], ["FinanceFlow", "VentureCapital Partners"]);
    assert!(!names.contains(&"TechStart Inc."));
    assert!(!names.contains(&"Corner Bakery"));
    assert!(matches.iter().all(|m| m.score > 0.3 && m.score <= 1.0));
}
