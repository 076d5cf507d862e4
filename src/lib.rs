//! Core engine for generating vocabulary multiple-choice questions.
//!
//! A configured LLM backend (hosted chat-completions API or a local
//! inference server) produces one fill-in-the-blank sentence per word, and
//! three distractors are drawn from the rest of the vocabulary pool. The
//! batch runner drives both over a set of items and writes finished MCQ
//! records back to the host's vocabulary store.

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
