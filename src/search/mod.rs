pub mod filter;
pub mod semantic;

pub use filter::substring_filter;
pub use semantic::{SearchError, SemanticSearchClient};
