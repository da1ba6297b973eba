//! The financial health score and the narratives written about a user's finances.

mod aggregator;
mod client;
mod narrative;
mod page;

pub use client::{
    ChatCompletionClient, CompletionConfig, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_TIMEOUT,
    DEFAULT_COMPLETION_URL,
};
pub use narrative::NarrativeGenerator;
pub use page::get_insights_page;

#[cfg(test)]
pub(crate) use narrative::narrative_tests::StubClient;
