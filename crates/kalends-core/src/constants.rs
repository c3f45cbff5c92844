/// Stable, opaque error codes shared across crates.
///
/// The protocol layer maps these to wire-level responses; the values never
/// change once published.
pub const ERROR_CODE_PREFIX: &str = "APP";

/// Title exceeds [`MAX_TITLE_LENGTH`] or contains control characters.
pub const ERR_TITLE_INVALID: &str = const_str::concat!(ERROR_CODE_PREFIX, "-0012");
/// Title missing on insert.
pub const ERR_TITLE_MISSING: &str = const_str::concat!(ERROR_CODE_PREFIX, "-0013");
/// End instant precedes start instant.
pub const ERR_END_BEFORE_START: &str = const_str::concat!(ERROR_CODE_PREFIX, "-0014");
/// Recurrence rule has no terminator (neither until nor count).
pub const ERR_RULE_UNBOUNDED: &str = const_str::concat!(ERROR_CODE_PREFIX, "-0016");
/// Recurrence rule is structurally invalid (interval, day mask, month, ordinal).
pub const ERR_RULE_INVALID: &str = const_str::concat!(ERROR_CODE_PREFIX, "-0017");
/// Confirmation addressed to a user who is not a participant.
pub const ERR_CONFIRM_FOREIGN: &str = const_str::concat!(ERROR_CODE_PREFIX, "-0059");

/// Maximum accepted title length, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Window, in days from the series start, over which an insert or
/// series-scoped update is conflict-checked.
pub const CONFLICT_WINDOW_DAYS: i64 = 28;
