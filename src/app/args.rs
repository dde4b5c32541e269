use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "dhis2-sms-receiver")]
#[command(about = "Receives and relays SMS for a DHIS2 instance")]
pub struct AppArgs {
    #[arg(long, env = "SMS_HOST", default_value = "0.0.0.0", help = "Address to bind")]
    pub host: String,

    #[arg(long, env = "SMS_PORT", default_value_t = 8002, help = "Port to listen on")]
    pub port: u16,

    #[arg(long, env = "SMS_STORE", value_enum, default_value_t = StoreBackend::Redis, help = "Where SMS records are kept")]
    pub store: StoreBackend,

    #[arg(long, env = "REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,

    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    #[arg(long, env = "REDIS_DB", default_value_t = 0, help = "Redis database index")]
    pub redis_db: i64,

    #[arg(long, env = "REDIS_PASSWORD")]
    pub redis_password: Option<String>,

    #[arg(
        long,
        env = "REDIS_TIMEOUT_MS",
        default_value_t = 2000,
        help = "Timeout for connecting to Redis and for each command"
    )]
    pub redis_timeout_ms: u64,

    #[arg(long, env = "SMS_KEY_PREFIX", default_value = "sms", help = "Prefix for store keys")]
    pub key_prefix: String,

    #[arg(
        long,
        env = "SMS_RETENTION",
        default_value_t = 10_000,
        help = "Number of most recent records kept"
    )]
    pub retention: usize,

    #[arg(
        long,
        env = "DHIS2_URL",
        help = "DHIS2 base URL; inbound SMS are forwarded when set"
    )]
    pub dhis2_url: Option<String>,

    #[arg(long, env = "DHIS2_USERNAME", default_value = "admin")]
    pub dhis2_username: String,

    #[arg(long, env = "DHIS2_PASSWORD", default_value = "district", hide_env_values = true)]
    pub dhis2_password: String,

    #[arg(long, env = "DHIS2_GATEWAY_ID", default_value = "sms-receiver")]
    pub dhis2_gateway_id: String,

    #[arg(long, env = "DHIS2_TIMEOUT_MS", default_value_t = 5000)]
    pub dhis2_timeout_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "LOG_DIR", help = "Also write rotated log files here")]
    pub log_dir: Option<PathBuf>,
}

impl AppArgs {
    pub fn from_cli() -> Self {
        <Self as Parser>::parse()
    }
}
