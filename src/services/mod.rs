pub mod accounts;
pub mod loader;
pub mod providers;
pub mod recommendations;
pub mod similarity;

pub use providers::MetadataProvider;
pub use similarity::SimilarityIndex;
