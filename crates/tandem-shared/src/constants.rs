/// Application name
pub const APP_NAME: &str = "Tandem";

/// Invite code length in characters
pub const CODE_LENGTH: usize = 6;

/// Alphabet used for invite codes (uppercase letters + digits)
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// How many fresh codes `create_heart` draws before giving up on a
/// collision-free insert
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// Check-in history window shown to the couple (most recent entries)
pub const CHECK_IN_HISTORY_LIMIT: usize = 30;

/// Widget timeline refresh cadence in seconds (~15 minutes)
pub const WIDGET_REFRESH_SECS: i64 = 900;
