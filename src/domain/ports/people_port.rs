//! People directory port definition.

use crate::domain::entities::UserId;

/// Identity oracle: who the current user is and how emails map to ids.
pub trait PeopleDirectory: Send + Sync {
    /// Returns the current user's id.
    fn my_user_id(&self) -> UserId;

    /// Returns the current user's email.
    fn my_email(&self) -> String;

    /// Resolves an email, case-insensitively, to a user id.
    fn user_id_by_email(&self, email: &str) -> Option<UserId>;

    /// Resolves a user id to the user's current email.
    fn email_by_user_id(&self, user_id: UserId) -> Option<String>;

    /// Checks whether `user_id` is the current user.
    fn is_my_user_id(&self, user_id: UserId) -> bool {
        self.my_user_id() == user_id
    }
}
