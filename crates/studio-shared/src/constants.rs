/// Application name
pub const APP_NAME: &str = "Studio Booking";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Minimum length of an account display name
pub const MIN_NAME_LEN: usize = 2;

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum length of a listing description
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Review ratings are whole stars in this inclusive range
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Participant name shown for guest messages that carry no name
pub const GUEST_PARTICIPANT_NAME: &str = "Guest Client";

/// Number of bookings shown as recent activity on the admin dashboard
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Milliseconds per hour, used for fractional-hour pricing
pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;
