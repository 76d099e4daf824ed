//! Command-line argument parsing

use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use storage_common::{DEFAULT_PAGE_SIZE, DEFAULT_PORT, DEFAULT_TRANSFER_PORT};

use crate::constants::{DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_ROOT_NAME};

/// Storage provider daemon
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// IP address to bind to (IPv4 or IPv6)
    #[arg(short, long, default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Port for control-plane connections
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Port for byte-stream transfer connections
    #[arg(short = 't', long, default_value_t = DEFAULT_TRANSFER_PORT)]
    pub transfer_port: u16,

    /// Name of a root to create at startup (repeatable)
    #[arg(short, long = "root", default_values_t = [DEFAULT_ROOT_NAME.to_string()])]
    pub roots: Vec<String>,

    /// Children returned per List page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Largest upload accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_SIZE)]
    pub max_upload_size: u64,

    /// Allow several siblings to share a name
    #[arg(long, default_value = "false")]
    pub allow_duplicate_names: bool,

    /// Exit after this many seconds with no connections or sessions (0 = never)
    #[arg(long, default_value_t = 0)]
    pub idle_timeout: u64,

    /// JSON file holding the account's credentials
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Account id the credentials belong to
    #[arg(long, default_value_t = 0)]
    pub account_id: u32,

    /// Service id the credentials belong to
    #[arg(long, default_value = "storage-provider")]
    pub service_id: String,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

impl Args {
    /// Validate argument combinations clap can't express
    pub fn validate(&self) -> Result<(), String> {
        if self.port == self.transfer_port {
            return Err(format!(
                "control port and transfer port must differ (both {})",
                self.port
            ));
        }
        if self.page_size == 0 {
            return Err("page size must be at least 1".to_string());
        }
        if self.roots.is_empty() {
            return Err("at least one root is required".to_string());
        }
        for root in &self.roots {
            storage_common::validators::validate_item_name(root)
                .map_err(|e| format!("invalid root name '{root}': {e:?}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["storaged"]);
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.transfer_port, DEFAULT_TRANSFER_PORT);
        assert_eq!(args.roots, vec![DEFAULT_ROOT_NAME.to_string()]);
        assert_eq!(args.idle_timeout, 0);
        assert!(!args.allow_duplicate_names);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_multiple_roots() {
        let args = Args::parse_from(["storaged", "--root", "Home", "--root", "Photos"]);
        assert_eq!(args.roots, vec!["Home".to_string(), "Photos".to_string()]);
    }

    #[test]
    fn test_same_ports_rejected() {
        let args = Args::parse_from(["storaged", "-p", "9000", "-t", "9000"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_bad_root_name_rejected() {
        let args = Args::parse_from(["storaged", "--root", "a/b"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let args = Args::parse_from(["storaged", "--page-size", "0"]);
        assert!(args.validate().is_err());
    }
}
