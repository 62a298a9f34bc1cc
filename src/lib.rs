//! # paperscout
//!
//! Research-paper discovery pipeline: turn a free-form research request into the
//! most relevant and most likely influential new papers.
//!
//! ## Modules
//!
//! - [`retriever`] - request → search query → candidate papers
//! - [`selector`] - LLM relevance ranking with schema-constrained output
//! - [`estimator`] - three-model influence ensemble and linear combiner
//! - [`planner`] - estimate, sort and surface the top papers
//! - [`notifier`] - alert sinks for surfaced papers
//! - [`semanticscholar`] - Semantic Scholar search client
//! - [`llm`] - OpenAI-compatible chat client
//! - [`config`] - pipeline configuration
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paperscout::config::Config;
//! use paperscout::llm::OpenAiChat;
//! use paperscout::retriever::Retriever;
//! use paperscout::semanticscholar::SemanticScholarClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let llm = Arc::new(OpenAiChat::new(&config.llm)?);
//!     let source = Arc::new(SemanticScholarClient::new(&config.search)?);
//!     let retriever = Retriever::new(llm, source);
//!     let query = retriever.generate_query("Generative AI").await?;
//!     println!("{}", query);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod estimator;
pub mod llm;
pub mod notifier;
pub mod paper;
pub mod planner;
pub mod prompts;
pub mod retriever;
pub mod selector;
pub mod semanticscholar;

pub use error::{Result, ScoutError};
pub use paper::{Paper, PaperSelection, YearRange};
