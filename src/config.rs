use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Nurse recommendation API: nurses by city, ranked by score.
#[derive(Debug, Clone, Parser)]
#[command(name = "nurse-finder", version, about)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "NURSE_FINDER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "NURSE_FINDER_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Nurse table (.parquet, .json or .csv)
    #[arg(long, env = "NURSE_FINDER_DATA_FILE", default_value = "nurse_data_frame.parquet")]
    pub data_file: PathBuf,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_service() {
        let config = Config::try_parse_from(["nurse-finder"]).unwrap();
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.data_file, PathBuf::from("nurse_data_frame.parquet"));
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "nurse-finder",
            "--host",
            "127.0.0.1",
            "--port",
            "9090",
            "--data-file",
            "data/nurses.csv",
        ])
        .unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9090");
        assert_eq!(config.data_file, PathBuf::from("data/nurses.csv"));
    }
}
