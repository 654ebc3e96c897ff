//! AI-assisted git commits and reviews.
//!
//! The language model is either the OpenAI chat API (when `OPENAI_API_KEY` is
//! set) or the locally installed `claude` CLI driven as a subprocess; see
//! [`ai::factory::ProviderFactory`].

pub mod ai;
pub mod cli;
pub mod commands;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod review;
pub mod ui;
