//! Core constants: collection names and keys, payload prefixes, state values.

// Collections and their key attributes.

pub const USERS_TABLE: &str = "users";
pub const USERS_KEY: &str = "user_id";

pub const CONTACTS_TABLE: &str = "contacts";
/// Synthetic attribute holding the rendered `week#user#partner` key.
pub const CONTACTS_KEY: &str = "key";

pub const CHATS_TABLE: &str = "chats";
pub const CHATS_KEY: &str = "id";

pub const MANUAL_MATCHES_TABLE: &str = "manual_matches";
/// Synthetic attribute holding the rendered `user#partner` key.
pub const MANUAL_MATCHES_KEY: &str = "key";

// Compact payload prefixes.

pub const EDIT_PROFILE_PREFIX: &str = "edit_profile";
pub const PARTICIPATE_PREFIX: &str = "participate";
pub const FEEDBACK_PREFIX: &str = "feedback";
pub const REVIEW_PROFILE_PREFIX: &str = "review_profile";

/// Bare callback data with no fields.
pub const CANCEL_EDIT_DATA: &str = "cancel_edit";
pub const CANCEL_FEEDBACK_DATA: &str = "cancel_feedback";

// Profile fields editable through `edit_profile`.

pub const NAME_FIELD: &str = "name";
pub const CITY_FIELD: &str = "city";
pub const LINKS_FIELD: &str = "links";
pub const ABOUT_FIELD: &str = "about";

// Contact outcome.

pub const CONFIRM_STATE: &str = "confirm";
pub const FAIL_STATE: &str = "fail";

// User pause period.

pub const WEEK_PERIOD: &str = "week";
pub const MONTH_PERIOD: &str = "month";

// Feedback scores.

pub const GREAT_SCORE: &str = "great";
pub const OK_SCORE: &str = "ok";
pub const BAD_SCORE: &str = "bad";

// Profile review actions.

pub const CONFIRM_ACTION: &str = "confirm";
pub const CANCEL_ACTION: &str = "cancel";
