//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [schema] Section Defaults
// ============================================================================

pub mod schema {
    use crate::data::SchemaVersion;

    pub fn version() -> Option<SchemaVersion> {
        None
    }
}

// ============================================================================
// [render] Section Defaults
// ============================================================================

pub mod render {
    use compact_str::CompactString;

    pub fn timeout_ms() -> Option<u64> {
        None
    }

    pub fn default_extension() -> CompactString {
        CompactString::const_new(crate::render::HTML_EXTENSION)
    }
}
