use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Mood, Preference, PreferenceState, RecommendationRequest, SelectionSet, Toggle};

/// Form state for one mood-selection-to-submission cycle
///
/// Created when the recommendation page is entered and dropped on a
/// successful submission or when the user navigates away. Nothing in here is
/// persisted.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    entered_at: DateTime<Utc>,
    moods: SelectionSet,
    preference: PreferenceState,
    notes: String,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Starts an empty session
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            entered_at: Utc::now(),
            moods: SelectionSet::new(),
            preference: PreferenceState::new(),
            notes: String::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entered_at(&self) -> DateTime<Utc> {
        self.entered_at
    }

    pub fn toggle_mood(&mut self, mood: Mood) -> Toggle {
        self.moods.toggle(mood)
    }

    pub fn select_preference(&mut self, preference: Preference) {
        self.preference.select(preference);
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn moods(&self) -> &SelectionSet {
        &self.moods
    }

    pub fn preference(&self) -> Option<Preference> {
        self.preference.get()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// At least one mood and a preference are required before submitting
    pub fn is_ready(&self) -> bool {
        !self.moods.is_empty() && self.preference.is_set()
    }

    /// Snapshots the form into a request stamped with the current time
    pub fn to_request(&self) -> Option<RecommendationRequest> {
        if self.moods.is_empty() {
            return None;
        }
        let preference = self.preference.get()?;
        Some(RecommendationRequest::new(
            self.moods.as_slice().to_vec(),
            preference,
            self.notes.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_not_ready() {
        let session = Session::new();
        assert!(!session.is_ready());
        assert!(session.to_request().is_none());
        assert!(session.notes().is_empty());
    }

    #[test]
    fn test_session_needs_mood_and_preference() {
        let mut session = Session::new();
        session.toggle_mood(Mood::new("Happy"));
        assert!(!session.is_ready());

        session.select_preference(Preference::Incongruence);
        assert!(session.is_ready());

        session.toggle_mood(Mood::new("Happy"));
        assert!(!session.is_ready());
        // Clearing moods leaves the preference alone
        assert_eq!(session.preference(), Some(Preference::Incongruence));
    }

    #[test]
    fn test_request_snapshot() {
        let mut session = Session::new();
        session.toggle_mood(Mood::new("Happy"));
        session.toggle_mood(Mood::new("Excited"));
        session.select_preference(Preference::Congruence);
        session.set_notes("Need a lift");

        let request = session.to_request().unwrap();
        assert_eq!(request.moods, vec![Mood::new("Happy"), Mood::new("Excited")]);
        assert_eq!(request.preference, Preference::Congruence);
        assert_eq!(request.personal_notes, "Need a lift");
        assert!(request.timestamp >= session.entered_at());
    }

    #[test]
    fn test_sessions_have_distinct_ids() {
        assert_ne!(Session::new().id(), Session::new().id());
    }
}
