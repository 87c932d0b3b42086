// Service exports
pub mod sessions;
pub mod store;
pub mod supabase;

pub use sessions::SessionRegistry;
pub use store::VenueStore;
pub use supabase::{StoreError, SupabaseClient, SupabaseTables};
