use chrono_tz::Tz;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Purpose |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/lounge | Work directory (database, logs) |
/// | ADMIN_USER_ID | 0 | The moderator's user identity |
/// | ADMIN_CHAT_ID | (unset) | Broadcast channel for confirmed bookings (optional) |
/// | ADMIN_PHONE | (placeholder) | Phone shown to guests in the main menu |
/// | INSTAGRAM_URL | (placeholder) | Venue Instagram link for the main menu |
/// | VENUE_TZ | Europe/Kyiv | Venue timezone for "today" checks |
/// | ENVIRONMENT | development | Runtime environment tag |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/lounge ADMIN_USER_ID=6073809255 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory for the database file and logs.
    pub work_dir: String,
    /// The single distinguished identity allowed to moderate bookings.
    pub admin_user_id: i64,
    /// Optional broadcast chat notified on confirmations.
    pub broadcast_chat_id: Option<i64>,
    /// Phone number guests can call; shown in the main menu.
    pub admin_phone: String,
    /// Venue Instagram link; shown in the main menu.
    pub instagram_url: String,
    /// Venue timezone; date validation compares against "today" here.
    pub venue_tz: Tz,
    /// Runtime environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to defaults.
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/lounge".into()),
            admin_user_id: std::env::var("ADMIN_USER_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            broadcast_chat_id: std::env::var("ADMIN_CHAT_ID")
                .ok()
                .and_then(|v| v.parse().ok()),
            admin_phone: std::env::var("ADMIN_PHONE").unwrap_or_else(|_| "+380000000000".into()),
            instagram_url: std::env::var("INSTAGRAM_URL")
                .unwrap_or_else(|_| "https://www.instagram.com/".into()),
            venue_tz: std::env::var("VENUE_TZ")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::Europe::Kyiv),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Override the fields tests care about.
    pub fn with_overrides(work_dir: impl Into<String>, admin_user_id: i64) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.admin_user_id = admin_user_id;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Whether this identity is the moderator.
    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin_user_id
    }

    /// Path of the redb database file under the work directory.
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("bookings.redb")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
