use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::ValidationError;

/// Most moods a single selection may hold
pub const MAX_MOODS: usize = 5;

/// A tag naming an emotional state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mood(String);

impl Mood {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of moods a page offers
#[derive(Debug, Clone, PartialEq)]
pub struct MoodVocabulary {
    moods: Vec<Mood>,
}

impl MoodVocabulary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut moods: Vec<Mood> = Vec::new();
        for name in names {
            let mood = Mood::new(name.into().trim());
            if !mood.as_str().is_empty() && !moods.contains(&mood) {
                moods.push(mood);
            }
        }
        Self { moods }
    }

    pub fn moods(&self) -> &[Mood] {
        &self.moods
    }

    /// Resolves user input to the vocabulary's spelling, ignoring case
    pub fn resolve(&self, input: &str) -> Result<Mood, ValidationError> {
        let wanted = input.trim();
        self.moods
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| ValidationError::UnknownMood(wanted.to_string()))
    }
}

impl Default for MoodVocabulary {
    fn default() -> Self {
        Self::new(crate::config::default_moods())
    }
}

/// What a toggle did to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The mood was absent and the selection was full; nothing changed
    AtCapacity,
}

/// Ordered, duplicate-free selection of at most [`MAX_MOODS`] moods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    moods: Vec<Mood>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes the mood if present, otherwise appends it when there is room
    pub fn toggle(&mut self, mood: Mood) -> Toggle {
        if let Some(pos) = self.moods.iter().position(|m| *m == mood) {
            self.moods.remove(pos);
            Toggle::Removed
        } else if self.moods.len() >= MAX_MOODS {
            Toggle::AtCapacity
        } else {
            self.moods.push(mood);
            Toggle::Added
        }
    }

    /// Whether the affordance for this mood should be enabled
    pub fn can_toggle(&self, mood: &Mood) -> bool {
        self.contains(mood) || !self.is_full()
    }

    pub fn contains(&self, mood: &Mood) -> bool {
        self.moods.contains(mood)
    }

    pub fn len(&self) -> usize {
        self.moods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moods.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.moods.len() >= MAX_MOODS
    }

    pub fn as_slice(&self) -> &[Mood] {
        &self.moods
    }

    /// Comma-joined form used in multipart uploads
    pub fn joined(&self) -> String {
        self.moods
            .iter()
            .map(Mood::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn clear(&mut self) {
        self.moods.clear();
    }
}

/// Desired emotional effect of a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    /// Match the current mood
    Congruence,
    /// Contrast the current mood
    Incongruence,
}

impl Display for Preference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preference::Congruence => write!(f, "congruence"),
            Preference::Incongruence => write!(f, "incongruence"),
        }
    }
}

impl FromStr for Preference {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "congruence" => Ok(Preference::Congruence),
            "incongruence" => Ok(Preference::Incongruence),
            other => Err(ValidationError::InvalidPreference(other.to_string())),
        }
    }
}

/// Single-valued preference choice, unset until the user picks one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceState {
    value: Option<Preference>,
}

impl PreferenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any earlier choice; there is no way back to unset
    pub fn select(&mut self, value: Preference) {
        self.value = Some(value);
    }

    pub fn get(&self) -> Option<Preference> {
        self.value
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }
}
