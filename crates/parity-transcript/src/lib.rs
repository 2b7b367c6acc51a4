//! Normalization of raw game output before comparison.
//!
//! The reference interpreter and the rewritten engine format the same text
//! differently: banner, embedded status line, hard wrapping near 80 columns,
//! prompt lines. Each transform here removes one of those differences and is
//! usable on its own; [`NormalizationPipeline`] runs them in the fixed order
//! the comparator relies on.

pub mod normalize;
pub mod room;

pub use normalize::{
    normalize_line_wrapping, normalize_output, parse_status_moves, strip_game_header, strip_prompt,
    strip_status_bar, NormalizationPipeline, NormalizeOptions, DEFAULT_PROMPT_MARKER,
};
pub use room::{is_movement_command, is_room_name, strip_room_description};
