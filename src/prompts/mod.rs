//! Prompt module for LLM-based operations.
//!
//! This module provides modular prompt templates for the pipeline's LLM tasks.

pub mod influence;
pub mod paper_selection;
pub mod search_query;
