pub mod docs_client;
pub mod drive_client;

pub use docs_client::GoogleDocsClient;
pub use drive_client::GoogleDriveClient;
