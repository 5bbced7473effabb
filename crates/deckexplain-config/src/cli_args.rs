use std::path::PathBuf;

/// CLI arguments for configuration override
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub max_retries: Option<u32>,
    pub base_url: Option<String>,
    pub uploads_dir: Option<PathBuf>,
    pub outputs_dir: Option<PathBuf>,
    pub bind_address: Option<String>,
}
