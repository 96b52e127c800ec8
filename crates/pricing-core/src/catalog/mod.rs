pub mod analysis_set;
pub mod search;
