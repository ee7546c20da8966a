//! Concrete metadata sources.
//!
//! Each submodule wraps a single external API and implements the provider
//! role traits from [`super::provider`] that the API supports.

pub mod generative;
pub mod omdb;
pub mod tmdb;

pub use generative::GenerativeProvider;
pub use omdb::OmdbProvider;
pub use tmdb::TmdbProvider;
