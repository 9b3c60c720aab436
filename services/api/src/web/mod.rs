pub mod documents;
pub mod identity;
pub mod rest;
pub mod state;
pub mod versions;

// Re-export the pieces the server binary wires together.
pub use identity::CurrentUser;
pub use rest::ApiDoc;
