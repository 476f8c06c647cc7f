//! Matching engine: sector affinity, weighted scoring and ranking of
//! candidate companies against a business need.

pub mod affinity;
pub mod ranker;
pub mod scorer;

pub use affinity::{Affinity, AffinityError, SectorAffinityTable, SectorRelations};
pub use ranker::{Match, MatchRanker, RankerConfig};
pub use scorer::{HeuristicScorer, MatchScore, MatchWeights, Scorer, SubScore};

pub const CRATE_NAME: &str = "bdt-match";
