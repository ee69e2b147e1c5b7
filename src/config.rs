//! Runtime configuration from command-line flags and environment variables.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "whatsapp-gateway",
    version,
    about = "Multi-session WhatsApp Web HTTP API"
)]
pub struct Config {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Root directory for per-session client credentials.
    #[arg(long, env = "WA_DATA_DIR", default_value = ".wwebjs_auth")]
    pub data_dir: PathBuf,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Render pairing QR codes in the terminal.
    #[arg(long, env = "WA_PRINT_QR", default_value_t = true, action = clap::ArgAction::Set)]
    pub print_qr: bool,
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}
