use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_SERVER_PORT: u16 = 3030;
const DEFAULT_SESSION_FILE: &str = ".riego-session.json";
const DEFAULT_TELEMETRY_INTERVAL_SECS: u64 = 30;
const DEFAULT_PROVISION_DELAY_MS: u64 = 50;

pub struct Config {
    api_base_url: String,
    server_port: u16,
    session_file: String,
    telemetry_interval_secs: u64,
    provision_delay_ms: u64,
    seed_demo_data: bool,
}

impl Config {
    pub fn api_base_url(&self) -> String {
        self.api_base_url.clone()
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn session_file(&self) -> String {
        self.session_file.clone()
    }

    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry_interval_secs)
    }

    pub fn provision_delay(&self) -> Duration {
        Duration::from_millis(self.provision_delay_ms)
    }

    pub fn seed_demo_data(&self) -> bool {
        self.seed_demo_data
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{} is not a valid value: {}", key, raw)),
        Err(_) => default,
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv::dotenv().ok();

    let api_base_url = env::var("API_BASE_URL")
        .map(|url| url.trim_end_matches('/').to_owned())
        .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
    let session_file =
        env::var("SESSION_FILE").unwrap_or_else(|_| DEFAULT_SESSION_FILE.to_owned());
    let server_port = parse_var("SERVER_PORT", DEFAULT_SERVER_PORT);
    let telemetry_interval_secs =
        parse_var("TELEMETRY_INTERVAL_SECS", DEFAULT_TELEMETRY_INTERVAL_SECS);
    let provision_delay_ms = parse_var("PROVISION_DELAY_MS", DEFAULT_PROVISION_DELAY_MS);
    let seed_demo_data = parse_var("SEED_DEMO_DATA", true);

    if telemetry_interval_secs == 0 {
        panic!("TELEMETRY_INTERVAL_SECS must be positive");
    }

    Config {
        api_base_url,
        server_port,
        session_file,
        telemetry_interval_secs,
        provision_delay_ms,
        seed_demo_data,
    }
});
