//! Integration tests for lakesync-catalog.
//!
//! Every collaborator is an in-memory fake, so no AWS credentials or object
//! store are needed.

mod driver;
mod fakes;
mod poller;
