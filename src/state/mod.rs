//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: lifecycle of a crawl run (idle, running, stopping, stopped)
//! - `Frontier`: locations discovered but not yet processed
//! - `VisitedSet`: locations that already have a stored record

mod frontier;
mod phase;
mod visited;

pub use frontier::Frontier;
pub use phase::CrawlPhase;
pub use visited::VisitedSet;
