use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::catalog::{new_request_id, CourseApiClient, EntityId};
use crate::config::AppConfig;
use crate::section_form::SectionDurationForm;

/// Shared handle to one open form.
pub type SharedForm = Arc<Mutex<SectionDurationForm>>;

struct OpenForm {
    form: SharedForm,
    last_used: Instant,
}

/// Section forms that are currently open, keyed by form ID.
///
/// Clients may abandon a form without deleting it, so a form that has not
/// been looked up for `idle_ttl` is dropped. Expired entries are removed
/// lazily on lookup and swept on every insert.
pub struct FormRegistry {
    entries: DashMap<String, OpenForm>,
    idle_ttl: Duration,
}

impl FormRegistry {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            idle_ttl,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn insert(&self, form_id: String, form: SharedForm) {
        self.cleanup_expired();
        self.entries.insert(
            form_id,
            OpenForm {
                form,
                last_used: Instant::now(),
            },
        );
    }

    /// Returns the form and marks it as used, or `None` if it is unknown or
    /// has been idle for too long.
    pub fn get(&self, form_id: &str) -> Option<SharedForm> {
        {
            let mut entry = self.entries.get_mut(form_id)?;
            if entry.last_used.elapsed() < self.idle_ttl {
                entry.last_used = Instant::now();
                return Some(entry.form.clone());
            }
        }

        let idle_ttl = self.idle_ttl;
        if self
            .entries
            .remove_if(form_id, |_, entry| entry.last_used.elapsed() >= idle_ttl)
            .is_some()
        {
            debug!("Dropped idle section form {}", form_id);
        }
        None
    }

    pub fn remove(&self, form_id: &str) -> Option<SharedForm> {
        self.entries.remove(form_id).map(|(_, entry)| entry.form)
    }

    /// Removes every idle form and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.last_used.elapsed() < self.idle_ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Dropped {} idle section form(s)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared state for the HTTP server.
pub struct AppState {
    /// Client for the course and section services
    pub client: CourseApiClient,
    pub forms: FormRegistry,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, client: CourseApiClient) -> Self {
        Self {
            client,
            forms: FormRegistry::new(config.form_idle_ttl()),
            config,
        }
    }

    /// Registers a new, closed form for `course_id` and returns its ID.
    pub fn register_form(&self, course_id: EntityId) -> (String, SharedForm) {
        let form_id = new_request_id();
        let form = Arc::new(Mutex::new(SectionDurationForm::with_default_minutes(
            course_id,
            self.config.default_section_minutes,
        )));
        self.forms.insert(form_id.clone(), form.clone());
        (form_id, form)
    }

    pub fn get_form(&self, form_id: &str) -> Option<SharedForm> {
        self.forms.get(form_id)
    }

    pub fn remove_form(&self, form_id: &str) -> Option<SharedForm> {
        self.forms.remove(form_id)
    }
}
