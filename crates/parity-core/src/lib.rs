pub mod analysis;
pub mod diff;
pub mod error;
pub mod transcript;

pub use analysis::*;
pub use diff::*;
pub use error::{ExitStatus, ParityError};
pub use transcript::*;

/// Current UTC time formatted as RFC 3339.
pub fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}
