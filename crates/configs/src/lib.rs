use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_racks")]
    pub racks: Vec<RackConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Github,
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Path of the rack document inside the store.
    #[serde(default = "default_document_path")]
    pub path: String,
    #[serde(default)]
    pub github: GithubStorageConfig,
    #[serde(default)]
    pub file: FileStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_document_path(),
            github: GithubStorageConfig::default(),
            file: FileStorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubStorageConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// `owner/name`
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Usually left empty and supplied through `GITHUB_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for GithubStorageConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            repo: String::new(),
            branch: default_branch(),
            token: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileStorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RackConfig {
    pub name: String,
    pub rows: u8,
    pub columns: u16,
}

fn default_document_path() -> String { "rack.json".into() }
fn default_api_url() -> String { "https://api.github.com".into() }
fn default_branch() -> String { "main".into() }
fn default_user_agent() -> String { concat!("rack-tracker/", env!("CARGO_PKG_VERSION")).into() }
fn default_timeout() -> u64 { 30 }
fn default_data_dir() -> String { "data".into() }

fn default_racks() -> Vec<RackConfig> {
    let rack = |name: &str, rows, columns| RackConfig { name: name.into(), rows, columns };
    vec![
        rack("No1", 16, 5),
        rack("No2", 16, 5),
        rack("No3", 16, 5),
        rack("No4", 16, 5),
        rack("Stock Box", 10, 10),
    ]
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Defaults with the built-in rack layout (serde's `Default` leaves it empty).
    pub fn with_defaults() -> Self {
        Self { racks: default_racks(), ..Self::default() }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize_from_env();
        self.server.normalize()?;
        self.storage.normalize_from_env();
        self.storage.validate()?;
        if self.racks.is_empty() {
            self.racks = default_racks();
        }
        Ok(())
    }
}

impl ServerConfig {
    /// `SERVER_HOST` / `SERVER_PORT` override the file values.
    pub fn normalize_from_env(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
    }

    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        // Fill the token from the environment when the file does not set one
        let missing = self.github.token.as_deref().map_or(true, |t| t.trim().is_empty());
        if missing {
            self.github.token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty());
        }
    }

    pub fn validate(&self) -> Result<()> {
        let path = self.path.trim();
        if path.is_empty() || path.starts_with('/') || path.split('/').any(|s| s == "..") {
            return Err(anyhow!("storage.path must be a relative path inside the store, got {:?}", self.path));
        }
        match self.backend {
            StorageBackend::Github => {
                let gh = &self.github;
                let mut parts = gh.repo.split('/');
                let well_formed = matches!(
                    (parts.next(), parts.next(), parts.next()),
                    (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty()
                );
                if !well_formed {
                    return Err(anyhow!("storage.github.repo must look like owner/name, got {:?}", gh.repo));
                }
                if gh.branch.trim().is_empty() {
                    return Err(anyhow!("storage.github.branch is empty"));
                }
                if gh.token.is_none() {
                    return Err(anyhow!("storage.github.token is empty; set it in config.toml or GITHUB_TOKEN"));
                }
                let lower = gh.api_url.to_lowercase();
                if !(lower.starts_with("https://") || lower.starts_with("http://")) {
                    return Err(anyhow!("storage.github.api_url must start with http:// or https://"));
                }
                if gh.timeout_secs == 0 {
                    return Err(anyhow!("storage.github.timeout_secs must be a positive number of seconds"));
                }
            }
            StorageBackend::File => {
                if self.file.data_dir.trim().is_empty() {
                    return Err(anyhow!("storage.file.data_dir is empty"));
                }
            }
            StorageBackend::Memory => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() -> Result<()> {
        let cfg = load_from_str("")?;
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.backend, StorageBackend::File);
        assert_eq!(cfg.storage.path, "rack.json");
        assert_eq!(cfg.storage.file.data_dir, "data");
        assert_eq!(cfg.racks.len(), 5);
        assert_eq!(cfg.racks[4], RackConfig { name: "Stock Box".into(), rows: 10, columns: 10 });
        Ok(())
    }

    #[test]
    fn parses_github_backend_and_custom_racks() -> Result<()> {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [storage]
            backend = "github"
            path = "inventory/rack.json"

            [storage.github]
            repo = "lab/antibodies"
            branch = "trunk"
            token = "ghp_example"

            [[racks]]
            name = "Freezer A"
            rows = 9
            columns = 9
            "#,
        )?;
        assert_eq!(cfg.storage.backend, StorageBackend::Github);
        assert_eq!(cfg.storage.github.repo, "lab/antibodies");
        assert_eq!(cfg.storage.github.api_url, "https://api.github.com");
        assert_eq!(cfg.storage.github.timeout_secs, 30);
        assert_eq!(cfg.racks, vec![RackConfig { name: "Freezer A".into(), rows: 9, columns: 9 }]);
        cfg.storage.validate()?;
        Ok(())
    }

    #[test]
    fn github_backend_requires_repo_and_token() {
        let mut storage = StorageConfig { backend: StorageBackend::Github, ..StorageConfig::default() };
        storage.github.token = Some("t".into());
        assert!(storage.validate().is_err());

        storage.github.repo = "owner/name/extra".into();
        assert!(storage.validate().is_err());

        storage.github.repo = "owner/name".into();
        assert!(storage.validate().is_ok());

        storage.github.token = None;
        assert!(storage.validate().is_err());
    }

    #[test]
    fn rejects_escaping_document_paths() {
        for bad in ["", "/rack.json", "../rack.json", "a/../../rack.json"] {
            let storage = StorageConfig { path: bad.into(), ..StorageConfig::default() };
            assert!(storage.validate().is_err(), "{bad:?}");
        }
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut server = ServerConfig { port: 0, ..ServerConfig::default() };
        assert!(server.normalize().is_err());
        let mut server = ServerConfig { worker_threads: Some(0), ..ServerConfig::default() };
        server.normalize().unwrap();
        assert_eq!(server.worker_threads, Some(4));
    }
}
