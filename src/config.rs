use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "quill", about = "A small two-role blogging server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    /// Inactivity window after which a session is dropped.
    pub session_minutes: u64,
    pub bcrypt_cost: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "quill_session".to_string(),
            session_minutes: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("quill.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".quill"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    /// Database file, falling back to `quill.db` in the working directory
    /// when the config was built without going through [`Config::load`].
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("quill.db"))
    }

    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.auth.session_minutes * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_for(data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.cookie_name, "quill_session");
        assert_eq!(config.auth.session_minutes, 30);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.database.path.is_none());
    }

    #[test]
    fn session_ttl_is_thirty_minutes_by_default() {
        let config = Config::default();
        assert_eq!(config.session_ttl(), std::time::Duration::from_secs(1800));
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli_for(Some(PathBuf::from("/tmp/test-quill")));
        assert_eq!(
            Config::data_dir(&cli).unwrap(),
            PathBuf::from("/tmp/test-quill")
        );
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = cli_for(Some(tmp.path().to_path_buf()));
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.db_path(), tmp.path().join("quill.db"));
    }

    #[test]
    fn load_applies_cli_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            config: None,
            host: Some("0.0.0.0".to_string()),
            port: Some(8080),
            data_dir: Some(tmp.path().to_path_buf()),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000

[database]
path = "/var/lib/quill/blog.db"

[auth]
cookie_name = "my_cookie"
session_minutes = 5
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: None,
            port: None,
            data_dir: Some(tmp.path().to_path_buf()),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.db_path(), PathBuf::from("/var/lib/quill/blog.db"));
        assert_eq!(config.auth.cookie_name, "my_cookie");
        assert_eq!(config.auth.session_minutes, 5);
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            data_dir: Some(tmp.path().to_path_buf()),
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
    }
}
