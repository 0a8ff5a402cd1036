//! Application record types and compact payload types.

use chrono::{DateTime, Utc};

use crate::encoding::key::{CompositeKey, KeyPart};
use crate::store::StoredRecord;
use crate::types::{
    CHATS_KEY, CHATS_TABLE, CONTACTS_KEY, CONTACTS_TABLE, MANUAL_MATCHES_KEY,
    MANUAL_MATCHES_TABLE, USERS_KEY, USERS_TABLE,
};

crate::record! {
    /// Free-form profile shown to a partner.
    pub struct Intro {
        name: String,
        city: String,
        links: String,
        about: String,
    }
}

crate::record! {
    pub struct User {
        user_id: i64,
        username: String,
        state: String,

        participate_date: DateTime<Utc>,
        pause_date: DateTime<Utc>,
        /// [`WEEK_PERIOD`](crate::types::WEEK_PERIOD) or
        /// [`MONTH_PERIOD`](crate::types::MONTH_PERIOD).
        pause_period: String,

        intro: Intro,

        partner_user_id: i64,
    }
}

impl User {
    /// `@username`, else the intro name, else the numeric id.
    pub fn mention(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return format!("@{username}");
        }
        if let Some(name) = self
            .intro
            .as_ref()
            .and_then(|i| i.name.as_deref())
            .filter(|n| !n.is_empty())
        {
            return name.to_string();
        }
        self.user_id.map(|id| id.to_string()).unwrap_or_default()
    }
}

impl StoredRecord for User {
    const TABLE: &'static str = USERS_TABLE;
    const KEY_ATTRIBUTE: &'static str = USERS_KEY;
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.user_id
    }
}

crate::record! {
    /// One pairing in one week, from `user_id`'s side.
    pub struct Contact {
        week_id: i64,
        user_id: i64,
        partner_user_id: i64,

        /// [`CONFIRM_STATE`](crate::types::CONFIRM_STATE) or
        /// [`FAIL_STATE`](crate::types::FAIL_STATE).
        state: String,
        /// One of the `*_SCORE` values in [`types`](crate::types).
        feedback: String,
    }
}

/// `week#user#partner`.
pub fn contact_key(week_id: i64, user_id: i64, partner_user_id: i64) -> CompositeKey {
    CompositeKey::new(vec![
        KeyPart::Int(week_id),
        KeyPart::Int(user_id),
        KeyPart::Int(partner_user_id),
    ])
}

impl StoredRecord for Contact {
    const TABLE: &'static str = CONTACTS_TABLE;
    const KEY_ATTRIBUTE: &'static str = CONTACTS_KEY;
    type Key = CompositeKey;

    fn key(&self) -> Option<CompositeKey> {
        Some(contact_key(
            self.week_id?,
            self.user_id?,
            self.partner_user_id?,
        ))
    }
}

crate::record! {
    /// Per-chat interaction state (which edit or feedback step is pending).
    pub struct Chat {
        id: i64,
        state: String,
    }
}

impl StoredRecord for Chat {
    const TABLE: &'static str = CHATS_TABLE;
    const KEY_ATTRIBUTE: &'static str = CHATS_KEY;
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }
}

crate::record! {
    /// An admin-forced pairing for the next round.
    pub struct ManualMatch {
        user_id: i64,
        partner_user_id: i64,
    }
}

/// `user#partner`.
pub fn manual_match_key(user_id: i64, partner_user_id: i64) -> CompositeKey {
    CompositeKey::new(vec![KeyPart::Int(user_id), KeyPart::Int(partner_user_id)])
}

impl StoredRecord for ManualMatch {
    const TABLE: &'static str = MANUAL_MATCHES_TABLE;
    const KEY_ATTRIBUTE: &'static str = MANUAL_MATCHES_KEY;
    type Key = CompositeKey;

    fn key(&self) -> Option<CompositeKey> {
        Some(manual_match_key(self.user_id?, self.partner_user_id?))
    }
}

crate::payload! {
    pub struct EditProfileData("edit_profile") {
        /// Name of an [`Intro`] attribute: one of the `*_FIELD` values in
        /// [`types`](crate::types).
        field: String,
    }
}

crate::payload! {
    pub struct ParticipateData("participate") {
        week_index: i64,
        agreed: i64,
    }
}

crate::payload! {
    pub struct FeedbackData("feedback") {
        week_index: i64,
        partner_user_id: i64,
        state: String,
        /// [`GREAT_SCORE`](crate::types::GREAT_SCORE),
        /// [`OK_SCORE`](crate::types::OK_SCORE) or
        /// [`BAD_SCORE`](crate::types::BAD_SCORE).
        feedback_score: String,
    }
}

crate::payload! {
    pub struct ReviewProfileData("review_profile") {
        /// [`CONFIRM_ACTION`](crate::types::CONFIRM_ACTION) or
        /// [`CANCEL_ACTION`](crate::types::CANCEL_ACTION).
        action: String,
        user_id: i64,
    }
}
