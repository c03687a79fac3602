// Settings for both flows, read from the process environment. A `.env`
// file in the working directory is loaded first when present.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_SWAP_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_PINATA_BASE_URL: &str = "https://api.pinata.cloud";

/// Pinata credentials as configured. Nothing is validated here; the
/// client resolves which scheme to use when it sends a request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PinataAuth {
    pub jwt: Option<String>,
    pub api_key: Option<String>,
    pub secret_api_key: Option<String>,
}

// Keep secrets out of logs.
impl std::fmt::Debug for PinataAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataAuth")
            .field("jwt", &self.jwt.as_ref().map(|_| "***"))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("secret_api_key", &self.secret_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the image-processing service; `/swap/` is appended.
    pub swap_api_url: String,
    pub pinata_base_url: String,
    pub pinata_auth: PinataAuth,
    /// Directory holding the transient metadata file during a publication.
    pub temp_dir: PathBuf,
    /// Directory where rendered hairstyle results are written.
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Load `.env` (if any) and then read the process environment.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let output_dir = get("SALON_OUTPUT_DIR")
            .map(PathBuf::from)
            .or_else(dirs::picture_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        AppConfig {
            swap_api_url: get("SWAP_API_URL").unwrap_or_else(|| DEFAULT_SWAP_API_URL.into()),
            pinata_base_url: get("PINATA_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PINATA_BASE_URL.into()),
            pinata_auth: PinataAuth {
                jwt: get("PINATA_JWT"),
                api_key: get("PINATA_API_KEY"),
                secret_api_key: get("PINATA_SECRET_API_KEY"),
            },
            temp_dir: get("TEMP")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            output_dir,
        }
    }
}
