//! InMemoryAchievements - 開発・テスト用の AchievementStore

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{EventId, StoreError, UserId};
use crate::ports::{Achievement, AchievementStore};

#[derive(Default)]
pub struct InMemoryAchievements {
    by_event: Mutex<HashMap<EventId, Achievement>>,
}

impl InMemoryAchievements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(&self, user_id: UserId) -> Vec<Achievement> {
        self.by_event
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_event
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AchievementStore for InMemoryAchievements {
    async fn award(&self, achievement: Achievement) -> Result<bool, StoreError> {
        let mut by_event = self.by_event.lock().unwrap_or_else(PoisonError::into_inner);
        if by_event.contains_key(&achievement.source_event) {
            return Ok(false);
        }
        by_event.insert(achievement.source_event, achievement);
        Ok(true)
    }
}
