// ⚙️ Configuration - loaded from `EMS_*` environment variables (and `.env`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000/api/v1";

/// Which services a server process mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Core,
    Ai,
    Risk,
    Compliance,
    Objectives,
    Audit,
    Ghg,
    Reporting,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 8] = [
        ServiceKind::Core,
        ServiceKind::Ai,
        ServiceKind::Risk,
        ServiceKind::Compliance,
        ServiceKind::Objectives,
        ServiceKind::Audit,
        ServiceKind::Ghg,
        ServiceKind::Reporting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Core => "core",
            ServiceKind::Ai => "ai",
            ServiceKind::Risk => "risk",
            ServiceKind::Compliance => "compliance",
            ServiceKind::Objectives => "objectives",
            ServiceKind::Audit => "audit",
            ServiceKind::Ghg => "ghg",
            ServiceKind::Reporting => "reporting",
        }
    }

    /// Parse a comma separated list (`"all"` selects every service).
    pub fn parse_list(raw: &str) -> Result<Vec<ServiceKind>, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return Ok(Self::ALL.to_vec());
        }

        let mut services = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind = Self::ALL
                .iter()
                .copied()
                .find(|k| k.as_str().eq_ignore_ascii_case(name))
                .ok_or_else(|| ConfigError::UnknownService(name.to_string()))?;
            if !services.contains(&kind) {
                services.push(kind);
            }
        }
        Ok(services)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

/// Retry and circuit breaker settings for calls between services.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_wait_min: Duration,
    pub retry_wait_max: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_wait_min: Duration::from_millis(1000),
            retry_wait_max: Duration::from_millis(10_000),
            breaker_threshold: 5,
            breaker_cooldown: Duration::from_secs(60),
        }
    }
}

/// Base URLs of the services other services call.
#[derive(Debug, Clone)]
pub struct ServiceUrls {
    pub ai: String,
    pub core: String,
    pub risk: String,
    pub objectives: String,
    pub ghg: String,
}

/// Default emission factors (kg CO2e per unit) used by `seed-factors`.
#[derive(Debug, Clone)]
pub struct DefaultFactors {
    pub electricity_kwh: f64,
    pub gasoline_liter: f64,
    pub diesel_liter: f64,
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    /// HTTP listen address
    pub bind_addr: SocketAddr,
    /// Services mounted by this process
    pub services: Vec<ServiceKind>,
    pub log_level: String,
    pub log_format: LogFormat,
    pub client: ClientSettings,
    pub urls: ServiceUrls,
    /// Ask the AI service to classify new aspects
    pub enable_ai_classification: bool,
    /// Optional JSON keyword rules for the classifier
    pub classifier_rules: Option<PathBuf>,
    /// Upper bound for `limit` on list endpoints
    pub max_page_size: u32,
    pub default_factors: DefaultFactors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("ems.db"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            services: ServiceKind::ALL.to_vec(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            client: ClientSettings::default(),
            urls: ServiceUrls {
                ai: DEFAULT_SERVICE_URL.to_string(),
                core: DEFAULT_SERVICE_URL.to_string(),
                risk: DEFAULT_SERVICE_URL.to_string(),
                objectives: DEFAULT_SERVICE_URL.to_string(),
                ghg: DEFAULT_SERVICE_URL.to_string(),
            },
            enable_ai_classification: true,
            classifier_rules: None,
            max_page_size: 1000,
            default_factors: DefaultFactors {
                electricity_kwh: 0.82,
                gasoline_liter: 2.31,
                diesel_liter: 2.68,
            },
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_path = get("EMS_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let bind_addr = match get("EMS_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("EMS_BIND_ADDR", raw))?,
            None => defaults.bind_addr,
        };

        let services = match get("EMS_SERVICES") {
            Some(raw) => ServiceKind::parse_list(&raw)?,
            None => defaults.services,
        };

        let log_format = match get("EMS_LOG_FORMAT").as_deref().map(str::to_lowercase) {
            None => defaults.log_format,
            Some(ref f) if f == "json" => LogFormat::Json,
            Some(ref f) if f == "text" => LogFormat::Text,
            Some(other) => return Err(ConfigError::Invalid("EMS_LOG_FORMAT", other)),
        };

        let client = ClientSettings {
            timeout: Duration::from_secs(parse_or(
                &get,
                "EMS_API_TIMEOUT_SECS",
                defaults.client.timeout.as_secs(),
            )?),
            max_retries: parse_or(&get, "EMS_API_RETRIES", defaults.client.max_retries)?,
            retry_wait_min: Duration::from_millis(parse_or(
                &get,
                "EMS_RETRY_WAIT_MIN_MS",
                defaults.client.retry_wait_min.as_millis() as u64,
            )?),
            retry_wait_max: Duration::from_millis(parse_or(
                &get,
                "EMS_RETRY_WAIT_MAX_MS",
                defaults.client.retry_wait_max.as_millis() as u64,
            )?),
            breaker_threshold: parse_or(
                &get,
                "EMS_BREAKER_THRESHOLD",
                defaults.client.breaker_threshold,
            )?,
            breaker_cooldown: Duration::from_secs(parse_or(
                &get,
                "EMS_BREAKER_COOLDOWN_SECS",
                defaults.client.breaker_cooldown.as_secs(),
            )?),
        };

        if client.max_retries == 0 {
            return Err(ConfigError::Invalid("EMS_API_RETRIES", "0".to_string()));
        }

        let urls = ServiceUrls {
            ai: get("EMS_AI_SERVICE_URL").unwrap_or(defaults.urls.ai),
            core: get("EMS_CORE_URL").unwrap_or(defaults.urls.core),
            risk: get("EMS_RISK_URL").unwrap_or(defaults.urls.risk),
            objectives: get("EMS_OBJECTIVES_URL").unwrap_or(defaults.urls.objectives),
            ghg: get("EMS_GHG_URL").unwrap_or(defaults.urls.ghg),
        };

        let enable_ai_classification = match get("EMS_ENABLE_AI_CLASSIFICATION") {
            Some(raw) => parse_bool(&raw)
                .ok_or(ConfigError::Invalid("EMS_ENABLE_AI_CLASSIFICATION", raw))?,
            None => defaults.enable_ai_classification,
        };

        let default_factors = DefaultFactors {
            electricity_kwh: parse_or(
                &get,
                "EMS_DEFAULT_ELECTRICITY_FACTOR",
                defaults.default_factors.electricity_kwh,
            )?,
            gasoline_liter: parse_or(
                &get,
                "EMS_DEFAULT_GASOLINE_FACTOR",
                defaults.default_factors.gasoline_liter,
            )?,
            diesel_liter: parse_or(
                &get,
                "EMS_DEFAULT_DIESEL_FACTOR",
                defaults.default_factors.diesel_liter,
            )?,
        };

        Ok(Self {
            database_path,
            bind_addr,
            services,
            log_level: get("EMS_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            client,
            urls,
            enable_ai_classification,
            classifier_rules: get("EMS_CLASSIFIER_RULES").map(PathBuf::from),
            max_page_size: parse_or(&get, "EMS_MAX_PAGE_SIZE", defaults.max_page_size)?,
            default_factors,
        })
    }

    pub fn serves(&self, kind: ServiceKind) -> bool {
        self.services.contains(&kind)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&'static str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
    /// `EMS_SERVICES` names a service that does not exist.
    #[error("Unknown service: {0}")]
    UnknownService(String),
}
