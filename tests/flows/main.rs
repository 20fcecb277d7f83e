//! Postgres backed workflow tests. Every test truncates the schema, so they all
//! live in this one binary and run serially.

mod cart;
mod common;
mod conflicts;
mod orders;
mod reviews;
mod wishlists;
