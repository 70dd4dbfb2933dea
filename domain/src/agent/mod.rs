//! Specialist agent domain: tags, knowledge, relevance and responses.

pub mod catalog;
pub mod domain_tag;
pub mod knowledge;
pub mod response;

pub use catalog::{builtin_catalog, builtin_knowledge};
pub use domain_tag::DomainTag;
pub use knowledge::{DomainKnowledge, KeywordTable, RelevanceScore, WeightedKeyword};
pub use response::AgentResponse;
