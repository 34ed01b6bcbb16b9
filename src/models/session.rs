use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Per-user conversational state, reduced to a closed set of tagged values.
/// One user owns at most one in-flight task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Upload accepted, request row not created yet.
    Submitting,
    Processing { request_id: Uuid },
}

#[derive(Default)]
pub struct SessionTracker {
    sessions: Mutex<HashMap<i64, SessionState>>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, user_id: i64) -> SessionState {
        self.lock()
            .get(&user_id)
            .cloned()
            .unwrap_or(SessionState::Idle)
    }

    /// Idle -> Submitting. Returns false if the user already has a task in flight.
    pub fn try_begin(&self, user_id: i64) -> bool {
        let mut sessions = self.lock();
        match sessions.get(&user_id) {
            None | Some(SessionState::Idle) => {
                sessions.insert(user_id, SessionState::Submitting);
                true
            }
            Some(_) => false,
        }
    }

    /// Submitting -> Processing, once the request row exists.
    pub fn attach_request(&self, user_id: i64, request_id: Uuid) {
        self.lock()
            .insert(user_id, SessionState::Processing { request_id });
    }

    /// Any state -> Idle. Called on every terminal path.
    pub fn finish(&self, user_id: i64) {
        self.lock().remove(&user_id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i64, SessionState>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_task_per_user() {
        let tracker = SessionTracker::new();
        assert!(tracker.try_begin(42));
        assert!(!tracker.try_begin(42));
        // Other users are unaffected.
        assert!(tracker.try_begin(7));
    }

    #[test]
    fn transitions_through_processing_back_to_idle() {
        let tracker = SessionTracker::new();
        let request_id = Uuid::new_v4();

        assert!(tracker.try_begin(42));
        assert_eq!(tracker.state(42), SessionState::Submitting);

        tracker.attach_request(42, request_id);
        assert_eq!(tracker.state(42), SessionState::Processing { request_id });
        assert!(!tracker.try_begin(42));

        tracker.finish(42);
        assert_eq!(tracker.state(42), SessionState::Idle);
        assert!(tracker.try_begin(42));
    }
}
