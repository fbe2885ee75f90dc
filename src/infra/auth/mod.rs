pub mod file_store;
pub mod google_oauth;

pub use file_store::FileCredentialStore;
pub use google_oauth::GoogleOAuthClient;
