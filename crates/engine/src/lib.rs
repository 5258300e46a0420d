//! Gift suggestion engine.
//!
//! Drives a language model through a tool-call loop: the model may ask for
//! seasonal and timing context about the gift date, gets the result fed back
//! into the conversation, and finishes with a JSON list of ranked gifts.

pub mod advisor;
pub mod config;
pub mod date_context;
pub mod llm;
pub mod routes;
pub mod tools;
