//! API-wide constants

/// Current API version segment
pub const API_VERSION: &str = "v0";

/// Prefix of every versioned route
pub const API_PREFIX: &str = "/api/v0";

/// Default and maximum page sizes for image listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Request bodies are small JSON documents
pub const MAX_BODY_BYTES: usize = 64 * 1024;
