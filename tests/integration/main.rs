//! Integration tests

mod common;
mod keepalive_tests;
mod scrape_tests;
