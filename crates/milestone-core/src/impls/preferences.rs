//! StaticPreferences - 明示的に opt-out したものだけ拒否する PreferenceGate

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::UserId;
use crate::ports::{Channel, NotificationCategory, PreferenceGate};

#[derive(Default)]
pub struct StaticPreferences {
    opted_out: RwLock<HashSet<(UserId, NotificationCategory, Channel)>>,
}

impl StaticPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opt_out(&self, user_id: UserId, category: NotificationCategory, channel: Channel) {
        self.opted_out
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user_id, category, channel));
    }

    pub fn opt_in(&self, user_id: UserId, category: NotificationCategory, channel: Channel) {
        self.opted_out
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(user_id, category, channel));
    }
}

#[async_trait]
impl PreferenceGate for StaticPreferences {
    async fn should_notify(
        &self,
        user_id: UserId,
        category: NotificationCategory,
        channel: Channel,
    ) -> bool {
        !self
            .opted_out
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user_id, category, channel))
    }
}
