//! Configuration loaded from environment variables.
//!
//! All settings have defaults so the tool can start with zero configuration
//! on a front-desk machine.

use std::path::PathBuf;

use gympass_shared::constants::{DEFAULT_BAR_HEIGHT, DEFAULT_MODULE_WIDTH};
use gympass_shared::symbol::RenderOptions;
use gympass_shared::TokenScheme;

const MODULE_WIDTH_RANGE: std::ops::RangeInclusive<u32> = 1..=10;
const BAR_HEIGHT_RANGE: std::ops::RangeInclusive<u32> = 10..=1000;

#[derive(Debug, Clone)]
pub struct GymConfig {
    /// SQLite database file.
    /// Env: `GYMPASS_DB_PATH`
    /// Default: `<platform data dir>/gympass.db`
    pub db_path: PathBuf,

    /// Directory holding rendered badge images.
    /// Env: `GYMPASS_BARCODE_DIR`
    /// Default: `./barcodes`
    pub barcode_dir: PathBuf,

    /// Directory backups are written to.
    /// Env: `GYMPASS_BACKUP_DIR`
    /// Default: `./backups`
    pub backup_dir: PathBuf,

    /// Layout of newly issued tokens (`fixed` or `delimited`).
    /// Env: `GYMPASS_TOKEN_SCHEME`
    /// Default: `fixed`
    pub token_scheme: TokenScheme,

    /// Pixels per barcode module.
    /// Env: `GYMPASS_MODULE_WIDTH`
    pub module_width: u32,

    /// Bar height in pixels.
    /// Env: `GYMPASS_BAR_HEIGHT`
    pub bar_height: u32,

    /// Whether a member may check in more than once on the same day.
    /// Env: `GYMPASS_ALLOW_DUPLICATE_CHECKIN` (true/false)
    /// Default: `true`
    pub allow_duplicate_checkin: bool,
}

impl Default for GymConfig {
    fn default() -> Self {
        Self {
            db_path: gympass_store::database::default_path()
                .unwrap_or_else(|_| PathBuf::from("gympass.db")),
            barcode_dir: PathBuf::from("./barcodes"),
            backup_dir: PathBuf::from("./backups"),
            token_scheme: TokenScheme::Fixed,
            module_width: DEFAULT_MODULE_WIDTH,
            bar_height: DEFAULT_BAR_HEIGHT,
            allow_duplicate_checkin: true,
        }
    }
}

impl GymConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("GYMPASS_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("GYMPASS_BARCODE_DIR") {
            config.barcode_dir = PathBuf::from(path);
        }

        if let Some(path) = lookup("GYMPASS_BACKUP_DIR") {
            config.backup_dir = PathBuf::from(path);
        }

        if let Some(val) = lookup("GYMPASS_TOKEN_SCHEME") {
            match val.parse::<TokenScheme>() {
                Ok(scheme) => config.token_scheme = scheme,
                Err(e) => tracing::warn!(value = %val, error = %e, "Invalid GYMPASS_TOKEN_SCHEME, using default"),
            }
        }

        if let Some(val) = lookup("GYMPASS_MODULE_WIDTH") {
            match val.parse::<u32>() {
                Ok(n) if MODULE_WIDTH_RANGE.contains(&n) => config.module_width = n,
                _ => tracing::warn!(value = %val, "Invalid GYMPASS_MODULE_WIDTH, using default"),
            }
        }

        if let Some(val) = lookup("GYMPASS_BAR_HEIGHT") {
            match val.parse::<u32>() {
                Ok(n) if BAR_HEIGHT_RANGE.contains(&n) => config.bar_height = n,
                _ => tracing::warn!(value = %val, "Invalid GYMPASS_BAR_HEIGHT, using default"),
            }
        }

        if let Some(val) = lookup("GYMPASS_ALLOW_DUPLICATE_CHECKIN") {
            config.allow_duplicate_checkin = val != "false" && val != "0";
        }

        config
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            module_width: self.module_width,
            bar_height: self.bar_height,
            ..RenderOptions::default()
        }
    }
}
