//! Fixture schemas and reference vectors for the twpb codec.
//!
//! The fixture files are the interoperability contract with other protobuf
//! implementations: each one holds a known message encoded exactly as a
//! standard proto3 serializer would encode it.

pub mod cli;
mod error;
mod schemas;
mod vectors;

pub use error::FixtureError;
pub use schemas::Schemas;
pub use vectors::{fixtures, Fixture};
