/*!
 * Subtitle extraction output processing.
 *
 * - `format`: sniffs style-sheet vs sequential caption content
 * - `srt`: sequential caption parser
 * - `document`: canonical style-sheet model, parser, normalizer and renderer
 * - `injector`: style and overlay event injection
 */

pub mod format;
pub mod srt;
pub mod document;
pub mod injector;

// Re-export main types
pub use format::SubtitleFormat;
pub use srt::SubtitleEntry;
pub use document::{AssColor, EventKind, OverlayEvent, StyleDefinition, SubtitleDocument, Timestamp};
pub use injector::{InjectionOutcome, StyleInjector};
