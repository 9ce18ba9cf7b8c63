// Constants module - centralized default values and fixed limits
//
// Every default used by the configuration layer, the watermarking pipeline
// and the remote optimizer lives here so the numbers are not scattered
// across modules as magic values.

// =============================================================================
// Output naming
// =============================================================================

/// Stem suffix of a watermarked file ("photo.png" -> "photo-w.jpg")
pub const WATERMARKED_SUFFIX: &str = "-w";

/// Stem suffix of an optimized file ("photo-w.jpg" -> "photo-wo.jpg")
pub const OPTIMIZED_SUFFIX: &str = "-wo";

/// Extension of every produced file, whatever the input format
pub const OUTPUT_EXTENSION: &str = "jpg";

/// JPEG quality used when encoding watermarked pictures
pub const OUTPUT_JPEG_QUALITY: u8 = 75;

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark opacity
pub const DEFAULT_OPACITY: f32 = 0.25;

/// Default watermark text
pub const DEFAULT_TEXT: &str = "www.arresto-momentum.com";

/// Default text colour (white)
pub const DEFAULT_COLOR: &str = "#FFFFFF";

/// Extensions picked up when a directory is given as input
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Font size the text fitting starts from, in pixels
pub const FONT_SIZE_START: f32 = 2.0;

/// Font size increment used while fitting text to the picture width
pub const FONT_SIZE_STEP: f32 = 2.0;

/// Outline fonts looked up, in order, when no usable font is configured
pub const DEFAULT_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

// =============================================================================
// Remote optimizer defaults
// =============================================================================

/// Compression calls allowed per month with a free-tier key
pub const COMPRESSION_QUOTA_CEILING: u64 = 500;

/// Additional attempts after the first one on transient failures
pub const DEFAULT_RETRY_BUDGET: u32 = 3;

/// Upper bound accepted for the configured retry budget
pub const MAX_RETRY_BUDGET: u32 = 10;

/// Default initial backoff in milliseconds (retry immediately)
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 0;

/// Default maximum backoff in milliseconds
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 2000;

/// Base URL of the remote compression service
pub const DEFAULT_TINIFY_ENDPOINT: &str = "https://api.tinify.com";

/// Timeout applied to every request sent to the compression service
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Response header carrying the number of compressions used this month
pub const COMPRESSION_COUNT_HEADER: &str = "Compression-Count";

// =============================================================================
// Configuration file
// =============================================================================

/// Directory name used under the platform configuration directory
pub const PRODUCT: &str = "watermark";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.yml";
