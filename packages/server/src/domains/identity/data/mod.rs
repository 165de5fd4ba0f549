pub mod pg;

pub use pg::PgIdentityStore;
