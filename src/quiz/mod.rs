// src/quiz/mod.rs

//! Quiz gameplay: the per-session state machine, scoring and ranking rules,
//! and the runtime that hosts live sessions.

pub mod runtime;
pub mod scoring;
pub mod session;
pub mod store;
