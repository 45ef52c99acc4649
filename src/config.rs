use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "KycVault";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Storage bucket name for uploaded compliance documents.
pub const STORAGE_BUCKET: &str = "kyc-documents";

/// Signed URLs expire after 60 seconds, for both preview and extraction input.
pub const SIGNED_URL_EXPIRY_SECS: u64 = 60;

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:7420";

/// Get the application data directory
/// ~/KycVault/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("KycVault")
}

/// Get the object-storage root directory (bucket lives under it)
pub fn storage_dir() -> PathBuf {
    app_data_dir().join(STORAGE_BUCKET)
}

/// Get the SQLite database path
pub fn database_path() -> PathBuf {
    app_data_dir().join("kycvault.db")
}

/// Extraction API endpoint. Overridable for self-hosted gateways.
pub fn extraction_base_url() -> String {
    std::env::var("KYCVAULT_EXTRACTION_URL")
        .unwrap_or_else(|_| "https://api.hyperbolic.xyz/v1".to_string())
}

/// Bearer token for the extraction API. Empty when unset; the client
/// reports a configuration error rather than sending an anonymous request.
pub fn extraction_api_key() -> String {
    std::env::var("KYCVAULT_EXTRACTION_API_KEY").unwrap_or_default()
}

/// Vision model used for field extraction.
pub fn extraction_model() -> String {
    std::env::var("KYCVAULT_EXTRACTION_MODEL")
        .unwrap_or_else(|_| "Qwen/Qwen2-VL-72B-Instruct".to_string())
}

/// Bind address for the HTTP API server.
pub fn bind_addr() -> String {
    std::env::var("KYCVAULT_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

/// Public base URL the server is reachable at, used when handing signed
/// file links to the extraction API. Defaults to the bind address.
pub fn public_base_url() -> String {
    std::env::var("KYCVAULT_PUBLIC_URL").unwrap_or_else(|_| format!("http://{}", bind_addr()))
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
