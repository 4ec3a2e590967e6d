use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::errors::StoreError;
use crate::gateway::NotificationApi;
use crate::kanban::models::{Notification, NotificationFilters};

use super::{AppState, Slice, StateCell, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub current_page: u32,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            unread_count: 0,
            loading: false,
            error: None,
            has_more: true,
            current_page: 1,
        }
    }
}

impl Slice for NotificationState {
    fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }
}

pub struct NotificationStore<G: ?Sized> {
    gateway: Arc<G>,
    state: Arc<StateCell<NotificationState>>,
    page_size: u32,
}

impl<G: ?Sized> Clone for NotificationStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            state: self.state.clone(),
            page_size: self.page_size,
        }
    }
}

impl<G: NotificationApi + ?Sized> NotificationStore<G> {
    pub fn new(gateway: Arc<G>, app: &AppState, page_size: u32) -> Self {
        Self {
            gateway,
            state: app.notifications.clone(),
            page_size: page_size.max(1),
        }
    }

    pub fn state(&self) -> Arc<NotificationState> {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<NotificationState>> {
        self.state.subscribe()
    }

    /// Fetch one page. Page 1 replaces the list; later pages are appended
    /// without duplicating ids already shown.
    pub async fn fetch_notifications(&self, mut filters: NotificationFilters) -> StoreResult<()> {
        let page = filters.page.unwrap_or(1).max(1);
        filters.page = Some(page);
        filters.limit.get_or_insert(self.page_size);

        self.state.update(|s| s.loading = true);
        match self.gateway.list_notifications(&filters).await {
            Ok(result) => {
                self.state.update(|s| {
                    if page == 1 {
                        s.notifications = result.notifications;
                    } else {
                        for notification in result.notifications {
                            if !s.notifications.iter().any(|n| n.id == notification.id) {
                                s.notifications.push(notification);
                            }
                        }
                    }
                    s.has_more = result.pagination.page < result.pagination.pages;
                    s.current_page = result.pagination.page.max(1);
                    s.loading = false;
                    s.error = None;
                });
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(err.user_message());
                });
                Err(err)
            }
        }
    }

    /// Fetch the page after the last one loaded. `Ok(false)` when there is none.
    pub async fn fetch_next_page(&self, mut filters: NotificationFilters) -> StoreResult<bool> {
        let current = self.state.snapshot();
        if !current.has_more {
            return Ok(false);
        }
        filters.page = Some(current.current_page + 1);
        self.fetch_notifications(filters).await?;
        Ok(true)
    }

    pub async fn fetch_unread_count(&self) -> StoreResult<u64> {
        match self.gateway.unread_count().await {
            Ok(count) => {
                self.state.update(|s| s.unread_count = count);
                Ok(count)
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.record_error(&err);
                Err(err)
            }
        }
    }

    pub async fn mark_as_read(&self, notification_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        let now = Utc::now();
        self.state.update(|s| {
            if let Some(n) = s
                .notifications
                .iter_mut()
                .find(|n| n.id == notification_id && !n.is_read)
            {
                n.is_read = true;
                n.read_at = Some(now);
                s.unread_count = s.unread_count.saturating_sub(1);
            }
        });

        match self.gateway.mark_read(notification_id).await {
            Ok(server) => {
                self.state.update(|s| {
                    if let Some(n) = s.notifications.iter_mut().find(|n| n.id == server.id) {
                        *n = server;
                    }
                    s.error = None;
                });
                Ok(())
            }
            Err(e) => {
                let err = StoreError::from(e);
                self.state.rollback(&snapshot, "mark_as_read", &err);
                Err(err)
            }
        }
    }

    pub async fn mark_all_as_read(&self) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        let now = Utc::now();
        self.state.update(|s| {
            for n in s.notifications.iter_mut().filter(|n| !n.is_read) {
                n.is_read = true;
                n.read_at = Some(now);
            }
            s.unread_count = 0;
        });

        if let Err(e) = self.gateway.mark_all_read().await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "mark_all_as_read", &err);
            return Err(err);
        }
        Ok(())
    }

    pub async fn delete_notification(&self, notification_id: &str) -> StoreResult<()> {
        let snapshot = self.state.snapshot();
        self.state.update(|s| {
            let was_unread = s
                .notifications
                .iter()
                .any(|n| n.id == notification_id && !n.is_read);
            s.notifications.retain(|n| n.id != notification_id);
            if was_unread {
                s.unread_count = s.unread_count.saturating_sub(1);
            }
        });

        if let Err(e) = self.gateway.delete_notification(notification_id).await {
            let err = StoreError::from(e);
            self.state.rollback(&snapshot, "delete_notification", &err);
            return Err(err);
        }
        Ok(())
    }

    pub fn reset(&self) {
        self.state.replace(NotificationState::default());
    }
}
