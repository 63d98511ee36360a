//! Browser-side half of Student Buddy: page extraction, the coordinator that
//! holds the current problem, and the client for the analysis backend.

pub mod coordinator;
pub mod extractor;
pub mod gateway;
pub mod page;
pub mod session;
pub mod storage;
