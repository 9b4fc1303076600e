pub mod error;
pub mod normalize;
pub mod resolve;
pub mod rules;
pub mod score;

pub use error::MatchingError;
pub use normalize::{BrandNormalizer, NameNormalizer};
pub use resolve::{EntityResolver, MatchDecision, MatchThresholds, DEFAULT_CANDIDATE_LIMIT};
pub use rules::{NormalizationRules, UnitRule};
pub use score::SimilarityScorer;
