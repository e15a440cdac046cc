//! Berufeanalyzer: extracts the structure of German vocational-training
//! curricula (Rahmenlehrpläne and Ausbildungsrahmenpläne) from converted
//! documents via an OpenAI-compatible model, enriches the result with ESCO
//! occupation and skill data, and writes nested JSON plus flat CSV exports.

pub mod config;
pub mod export;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod taxonomy;
