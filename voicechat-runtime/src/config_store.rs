use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use voicechat_core::config::ClientConfig;

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<ClientConfig> {
        let bytes = fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: ClientConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// Like `load`, but a missing file is first written with the defaults so
    /// there is something to edit.
    pub fn load_or_create(&self) -> anyhow::Result<ClientConfig> {
        if self.path.exists() {
            return self.load();
        }
        let cfg = ClientConfig::default();
        self.save(&cfg)?;
        log::info!("wrote default config to {}", self.path.display());
        Ok(cfg)
    }

    /// Writes the whole file atomically.
    pub fn save(&self, cfg: &ClientConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("create config directory: {}", dir.display()))?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp file in {}", dir.display()))?;
        tmp.write_all(&json).context("write config")?;
        tmp.as_file().sync_all().context("flush config")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replace file: {}", self.path.display()))?;
        Ok(())
    }
}
