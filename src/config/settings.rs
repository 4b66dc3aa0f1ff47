use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub scratch_dir: PathBuf,
    pub cdn_base_url: String,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
}

impl AppConfig {
    pub fn new() -> Result<Self, std::env::VarError> {
        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 3000),
            scratch_dir: PathBuf::from(env::get_or(EnvKey::ScratchDir, "/tmp/reels-scratch")),
            cdn_base_url: env::get(EnvKey::CdnBaseUrl)?,
            s3_endpoint: env::get(EnvKey::S3Endpoint)?,
            s3_bucket: env::get(EnvKey::S3Bucket)?,
            s3_access_key: env::get(EnvKey::S3AccessKey)?,
            s3_secret_key: env::get(EnvKey::S3SecretKey)?,
        })
    }
}
