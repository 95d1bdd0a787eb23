//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Assistant guidelines, sent once at the top of every prompt
pub const SYSTEM: &str = include_str!("../../prompts/system.pmt");

/// Wrapper for a single retrieved chunk
pub const DOCUMENT: &str = include_str!("../../prompts/document.pmt");

/// Trailing question block
pub const FOOTER: &str = include_str!("../../prompts/footer.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "system" => {
            debug!("get_embedded: matched system");
            Some(SYSTEM)
        }
        "document" => {
            debug!("get_embedded: matched document");
            Some(DOCUMENT)
        }
        "footer" => {
            debug!("get_embedded: matched footer");
            Some(FOOTER)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
