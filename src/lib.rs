// Twitoff: which of two Twitter users is more likely to have written a tweet?
//
// This is the library root. Each module corresponds to one stage of the
// ingest → store → vectorize → train → predict pipeline.

pub mod classify;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod output;
pub mod status;
pub mod vectorize;
