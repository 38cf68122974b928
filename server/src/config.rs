use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Minimal chat relay speaking a subset of IRC.
#[derive(Parser, Debug, Clone)]
#[command(name = "relayd", version)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "RELAY_PORT", default_value_t = shared::DEFAULT_PORT)]
    pub port: u16,

    /// Name used as the prefix of numbered replies
    #[arg(long, env = "RELAY_SERVER_NAME", default_value = shared::SERVER_NAME)]
    pub server_name: String,
}

impl Config {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: shared::DEFAULT_PORT,
            server_name: shared::SERVER_NAME.to_string(),
        }
    }
}
