pub mod auction;
pub mod blocklist;
pub mod brand;
pub mod engine;
pub mod filters;
pub mod sourcing;

pub use auction::AuctionScorer;
pub use blocklist::Blocklist;
pub use engine::{BatchOutcome, DecisionEngine, DecisionError};
pub use filters::{Filter, FilterChain};
pub use sourcing::{CandidateSource, FixtureCatalog};
