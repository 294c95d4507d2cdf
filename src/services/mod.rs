// Service exports
pub mod cache;
pub mod candidates;
pub mod postgres;
pub mod supabase;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use candidates::{CandidateError, CandidateSupplier, SupabaseCandidates};
pub use postgres::{PostgresError, PostgresStore, SwipeAction};
pub use supabase::{JwtVerifier, SupabaseAuth, SupabaseClient, SupabaseError};
