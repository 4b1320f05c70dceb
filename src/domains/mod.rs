//! Domains module containing business logic organized by bounded contexts.
//!
//! Only the tools domain is exposed; the server advertises no prompts or
//! resources.

pub mod tools;
