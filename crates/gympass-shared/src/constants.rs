/// Fixed prefix every badge token starts with
pub const TOKEN_PREFIX: &str = "GYM";

/// Separator used by the delimited token scheme
pub const TOKEN_DELIMITER: char = '-';

/// Minimum length of a structurally valid token
pub const TOKEN_MIN_LEN: usize = 20;

/// Width of the zero-padded client id segment (fixed-width scheme)
pub const CLIENT_ID_WIDTH: usize = 4;

/// Largest client id the fixed-width scheme can carry
pub const MAX_FIXED_CLIENT_ID: i64 = 9_999;

/// Timestamp segment layout (14 digits)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Length of the random suffix in the fixed-width scheme (hex chars)
pub const FIXED_SUFFIX_LEN: usize = 8;

/// Length of the base62 rendering of a 128-bit value
pub const DELIMITED_SUFFIX_LEN: usize = 22;

/// Artifact file name prefix (`barcode_<token>.png`)
pub const ARTIFACT_PREFIX: &str = "barcode_";

/// Artifact file extension
pub const ARTIFACT_EXTENSION: &str = "png";

/// Quiet zone on each side of a Code128 symbol, in modules
pub const QUIET_ZONE_MODULES: usize = 10;

/// Default bar width in pixels per module
pub const DEFAULT_MODULE_WIDTH: u32 = 2;

/// Default bar height in pixels
pub const DEFAULT_BAR_HEIGHT: u32 = 80;

/// Calendar date format stored alongside attendance rows
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days before a subscription ends at which check-ins start warning
pub const SUBSCRIPTION_WARNING_DAYS: i64 = 7;

/// Minimum query length for client search
pub const CLIENT_SEARCH_MIN_LEN: usize = 2;

/// Minimum query length for barcode search
pub const BARCODE_SEARCH_MIN_LEN: usize = 3;
