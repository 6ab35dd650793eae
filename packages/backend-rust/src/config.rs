use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Browsers cap local storage at roughly 5 MiB per origin.
const DEFAULT_PROGRESS_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub public_dir: PathBuf,
    pub views_dir: PathBuf,
    pub data_dir: PathBuf,
    pub progress_dir: PathBuf,
    pub progress_quota_bytes: Option<usize>,
    pub achievement_catalog: Option<PathBuf>,
    pub nutrition_db_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let progress_dir = env_path("PROGRESS_DIR").unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bootcamp")
        });

        let progress_quota_bytes = match std::env::var("PROGRESS_QUOTA_BYTES") {
            Ok(value) if value.trim() == "0" => None,
            Ok(value) => Some(value.trim().parse().unwrap_or(DEFAULT_PROGRESS_QUOTA_BYTES)),
            Err(_) => Some(DEFAULT_PROGRESS_QUOTA_BYTES),
        };

        Self {
            host,
            port,
            log_level,
            public_dir: env_path("PUBLIC_DIR").unwrap_or_else(|| PathBuf::from("public")),
            views_dir: env_path("VIEWS_DIR").unwrap_or_else(|| PathBuf::from("views")),
            data_dir: env_path("DATA_DIR").unwrap_or_else(|| PathBuf::from("data")),
            progress_dir,
            progress_quota_bytes,
            achievement_catalog: env_path("ACHIEVEMENT_CATALOG"),
            nutrition_db_path: env_path("NUTRITION_DB_PATH").unwrap_or_else(|| {
                PathBuf::from("../nutrition-tracker-local/nutrition.db")
            }),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}
