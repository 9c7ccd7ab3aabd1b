//! Infrastructure layer: token verification, full-token exchange and
//! parsed-user caching.

pub mod cache;
pub mod fetcher;
pub mod parser;
pub mod testing;
pub mod verifier;

pub use cache::CachedParser;
pub use fetcher::{BearerFetcher, CachedBearerFetcher, FetchError, GraphqlBearerFetcher};
pub use parser::{JwtParser, Parser};
pub use verifier::{Rs256Verifier, TokenVerifier};
