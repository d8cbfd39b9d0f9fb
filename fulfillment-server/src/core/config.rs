//! Server configuration

/// Server configuration - every knob of the fulfillment engine
///
/// # Environment variables
///
/// All settings can be overridden through environment variables:
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/hermit | Working directory (databases, logs) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | TIMEZONE | UTC | Business timezone (order numbering) |
/// | CURRENCY | USD | Default cart/order currency |
/// | TAX_RATE_PERCENT | 0 | Flat tax on the discounted subtotal |
/// | ORIGIN_POSTAL_CODE | 10001 | Warehouse origin for rate quotes |
/// | RATE_PROVIDER_URL | (unset) | Rate provider base URL; static rates when unset |
/// | RATE_TIMEOUT_MS | 10000 | Rate provider request timeout |
/// | RATE_CACHE_TTL_HOURS | 24 | Shipping rate cache TTL |
/// | PAYMENT_GATEWAY_URL | (unset) | Gateway base URL; mock gateway when unset |
/// | PAYMENT_TIMEOUT_MS | 15000 | Gateway request timeout |
/// | GUEST_CART_TTL_HOURS | 168 | Guest cart lifetime / account inactivity window |
/// | CART_SWEEP_INTERVAL_SECS | 300 | Expiry sweep period |
/// | VERIFY_INTERVAL_SECS | 3600 | Snapshot verification period |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/hermit HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for databases and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Business timezone
    pub timezone: chrono_tz::Tz,
    /// Default currency for new carts
    pub currency: String,
    /// Flat tax rate applied to the discounted merchandise subtotal
    pub tax_rate_percent: f64,

    // === Shipping ===
    /// Warehouse origin postal code
    pub origin_postal_code: String,
    /// Rate provider base URL (None = static rates)
    pub rate_provider_url: Option<String>,
    /// Rate provider timeout (milliseconds)
    pub rate_timeout_ms: u64,
    /// Rate cache TTL (hours)
    pub rate_cache_ttl_hours: u64,

    // === Payments ===
    /// Payment gateway base URL (None = mock gateway)
    pub payment_gateway_url: Option<String>,
    /// Gateway timeout (milliseconds)
    pub payment_timeout_ms: u64,

    // === Background tasks ===
    /// Guest cart lifetime / account cart inactivity window (hours)
    pub guest_cart_ttl_hours: u64,
    /// Cart expiry sweep period (seconds)
    pub cart_sweep_interval_secs: u64,
    /// Snapshot verification period (seconds)
    pub verify_interval_secs: u64,
    /// Graceful shutdown budget (milliseconds)
    pub shutdown_timeout_ms: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Self {
        let timezone = std::env::var("TIMEZONE")
            .ok()
            .and_then(|tz| tz.parse().ok())
            .unwrap_or(chrono_tz::UTC);
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/hermit".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone,
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "USD".into()),
            tax_rate_percent: env_parse("TAX_RATE_PERCENT", 0.0),
            origin_postal_code: std::env::var("ORIGIN_POSTAL_CODE")
                .unwrap_or_else(|_| "10001".into()),
            rate_provider_url: std::env::var("RATE_PROVIDER_URL").ok().filter(|v| !v.is_empty()),
            rate_timeout_ms: env_parse("RATE_TIMEOUT_MS", 10_000),
            rate_cache_ttl_hours: env_parse("RATE_CACHE_TTL_HOURS", 24),
            payment_gateway_url: std::env::var("PAYMENT_GATEWAY_URL")
                .ok()
                .filter(|v| !v.is_empty()),
            payment_timeout_ms: env_parse("PAYMENT_TIMEOUT_MS", 15_000),
            guest_cart_ttl_hours: env_parse("GUEST_CART_TTL_HOURS", 168),
            cart_sweep_interval_secs: env_parse("CART_SWEEP_INTERVAL_SECS", 300),
            verify_interval_secs: env_parse("VERIFY_INTERVAL_SECS", 3600),
            shutdown_timeout_ms: env_parse("SHUTDOWN_TIMEOUT_MS", 10_000),
        }
    }

    /// Guest cart TTL in milliseconds
    pub fn guest_cart_ttl_ms(&self) -> i64 {
        self.guest_cart_ttl_hours as i64 * 3600 * 1000
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
