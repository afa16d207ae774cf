pub mod boolean;
pub mod ranked;

pub use boolean::{BooleanQueryEvaluator, BooleanQueryParser, Operator, QueryToken};
pub use ranked::{rank, RankedMatches};
