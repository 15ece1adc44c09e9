pub mod admin;
pub mod identity;
pub mod rest;
pub mod state;
pub mod student;
pub mod teacher;

// Re-export the pieces the binary needs to build the web server router.
pub use identity::require_identity;
pub use rest::ApiDoc;
