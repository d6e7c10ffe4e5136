//! Optional third-party lookups folded into notification messages.
//!
//! Everything here is best-effort: a missing API key or a failed call
//! degrades the message (the section is omitted) and never blocks delivery.

mod mdblist;
mod tmdb;
mod youtube;

pub use mdblist::MdblistClient;
pub use tmdb::TmdbClient;
pub use youtube::YoutubeClient;
