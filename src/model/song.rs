//! Catalog entries: songs and the transition rules that bridge them

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::audio::{AudioSource, SourceKind};
use crate::error::{CatalogError, Result};

/// Wildcard target used by catalog files for "transitions into any song"
pub const ANY_TARGET: &str = "ANY";

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Catalog identity of a song
    SongId
);
string_id!(
    /// Identity of a song placed on the canvas
    NodeId
);
string_id!(
    /// Identity of a directed connection between two nodes
    EdgeId
);

/// Parse an `m:ss` clock string into a duration.
pub fn parse_clock(value: &str) -> Result<Duration> {
    let invalid = || CatalogError::InvalidClock(value.to_string());

    let (minutes, seconds) = value.trim().split_once(':').ok_or_else(invalid)?;
    if seconds.len() != 2 {
        return Err(invalid());
    }
    let minutes: u64 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
    if seconds >= 60 {
        return Err(invalid());
    }

    Ok(Duration::from_secs(minutes * 60 + seconds))
}

pub fn format_clock(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Which song a transition rule leads into
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionTarget {
    Song(SongId),
    Any,
}

impl TransitionTarget {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" => None,
            ANY_TARGET => Some(Self::Any),
            id => Some(Self::Song(SongId::new(id))),
        }
    }

    pub fn is_exact(&self, song: &SongId) -> bool {
        matches!(self, Self::Song(id) if id == song)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn applies_to(&self, song: &SongId) -> bool {
        self.is_wildcard() || self.is_exact(song)
    }
}

/// A transition clip bridging one song into another (or into any song)
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRule {
    pub name: String,
    pub target: TransitionTarget,
    pub label: String,
    /// Offset in the source song where the transition takes over
    pub cut_point: Duration,
    /// Offset in the next song where playback resumes after the clip
    pub resume_point: Duration,
    pub audio_file: String,
    pub is_default: bool,
    pub clip_length: Option<Duration>,
}

impl TransitionRule {
    pub fn new(
        name: impl Into<String>,
        target: &str,
        cut_point: &str,
        resume_point: &str,
        audio_file: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let target =
            TransitionTarget::parse(target).ok_or_else(|| CatalogError::MissingTarget(name.clone()))?;

        Ok(Self {
            label: name.clone(),
            name,
            target,
            cut_point: parse_clock(cut_point)?,
            resume_point: parse_clock(resume_point)?,
            audio_file: audio_file.into(),
            is_default: false,
            clip_length: None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_clip_length(mut self, length: Duration) -> Self {
        self.clip_length = Some(length);
        self
    }

    pub fn audio_source(&self, songs_dir: &Path) -> AudioSource {
        AudioSource {
            path: songs_dir.join(&self.audio_file),
            length: self.clip_length,
            kind: SourceKind::Transition,
        }
    }
}

/// Immutable catalog entry for one song
#[derive(Clone, Debug, PartialEq)]
pub struct SongMetadata {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    /// Duration exactly as the catalog spells it
    pub duration_label: String,
    pub audio_file: String,
    pub transitions: Vec<TransitionRule>,
}

impl SongMetadata {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration: &str,
        audio_file: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(CatalogError::MissingId);
        }
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CatalogError::MissingTitle(id));
        }

        Ok(Self {
            id: SongId::new(id),
            title,
            artist: artist.into(),
            duration: parse_clock(duration)?,
            duration_label: duration.trim().to_string(),
            audio_file: audio_file.into(),
            transitions: Vec::new(),
        })
    }

    pub fn with_transitions(mut self, transitions: Vec<TransitionRule>) -> Self {
        self.transitions = transitions;
        self
    }

    pub fn audio_source(&self, songs_dir: &Path) -> AudioSource {
        AudioSource {
            path: songs_dir.join(&self.audio_file),
            length: Some(self.duration),
            kind: SourceKind::Song,
        }
    }

    /// Rules usable on a connection into `target`, in catalog order.
    pub fn available_transitions_to<'a>(
        &'a self,
        target: &'a SongId,
    ) -> impl Iterator<Item = &'a TransitionRule> + 'a {
        self.transitions.iter().filter(move |rule| rule.target.applies_to(target))
    }

    /// The rule pre-attached when a connection into `target` is created.
    ///
    /// Exact target matches win over wildcards; within each group a rule
    /// flagged as default wins, otherwise the first in catalog order.
    pub fn preferred_transition_to(&self, target: &SongId) -> Option<&TransitionRule> {
        pick_rule(&self.transitions, |rule| rule.target.is_exact(target))
            .or_else(|| pick_rule(&self.transitions, |rule| rule.target.is_wildcard()))
    }
}

fn pick_rule<'a>(
    rules: &'a [TransitionRule],
    matches: impl Fn(&TransitionRule) -> bool,
) -> Option<&'a TransitionRule> {
    rules
        .iter()
        .filter(|rule| matches(*rule))
        .find(|rule| rule.is_default)
        .or_else(|| rules.iter().find(|rule| matches(*rule)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, target: &str) -> TransitionRule {
        TransitionRule::new(name, target, "1:00", "0:00", format!("{name}.mp3")).unwrap()
    }

    #[test]
    fn parses_clock_strings() {
        assert_eq!(parse_clock("4:01").unwrap(), Duration::from_secs(241));
        assert_eq!(parse_clock("0:14").unwrap(), Duration::from_secs(14));
        assert_eq!(parse_clock(" 12:00 ").unwrap(), Duration::from_secs(720));
    }

    #[test]
    fn rejects_malformed_clock_strings() {
        for value in ["", "241", "4:1", "4:60", "a:00", "4:0x", "-1:00"] {
            assert!(parse_clock(value).is_err(), "{value:?} should be rejected");
        }
    }

    #[test]
    fn formats_clock() {
        assert_eq!(format_clock(Duration::from_millis(241_900)), "4:01");
        assert_eq!(format_clock(Duration::ZERO), "0:00");
    }

    #[test]
    fn song_constructor_validates_required_fields() {
        assert!(matches!(
            SongMetadata::new("", "Title", "Artist", "3:00", "a.mp3"),
            Err(CatalogError::MissingId)
        ));
        assert!(matches!(
            SongMetadata::new("1", " ", "Artist", "3:00", "a.mp3"),
            Err(CatalogError::MissingTitle(_))
        ));
        assert!(matches!(
            SongMetadata::new("1", "Title", "Artist", "three", "a.mp3"),
            Err(CatalogError::InvalidClock(_))
        ));
        assert!(matches!(
            TransitionRule::new("x", "", "1:00", "0:00", "x.mp3"),
            Err(CatalogError::MissingTarget(_))
        ));
    }

    #[test]
    fn wildcard_target_parses_from_any() {
        assert_eq!(TransitionTarget::parse("ANY"), Some(TransitionTarget::Any));
        assert_eq!(
            TransitionTarget::parse("17"),
            Some(TransitionTarget::Song(SongId::new("17")))
        );
    }

    #[test]
    fn preferred_transition_takes_exact_match_over_default_wildcard() {
        let song = SongMetadata::new("12", "Just Dance", "Lady Gaga", "4:01", "jd.mp3")
            .unwrap()
            .with_transitions(vec![rule("wild", "ANY").as_default(), rule("exact", "17")]);

        let preferred = song.preferred_transition_to(&SongId::new("17")).unwrap();
        assert_eq!(preferred.name, "exact");
    }

    #[test]
    fn preferred_transition_falls_back_to_default_wildcard_then_first_wildcard() {
        let song = SongMetadata::new("12", "Just Dance", "Lady Gaga", "4:01", "jd.mp3")
            .unwrap()
            .with_transitions(vec![
                rule("other", "4"),
                rule("first-wild", "ANY"),
                rule("default-wild", "ANY").as_default(),
            ]);
        let target = SongId::new("7");
        assert_eq!(song.preferred_transition_to(&target).unwrap().name, "default-wild");

        let plain = song.clone().with_transitions(vec![rule("first-wild", "ANY"), rule("second", "ANY")]);
        assert_eq!(plain.preferred_transition_to(&target).unwrap().name, "first-wild");

        let none = song.with_transitions(vec![rule("other", "4")]);
        assert!(none.preferred_transition_to(&target).is_none());
    }

    #[test]
    fn available_transitions_keep_catalog_order() {
        let song = SongMetadata::new("12", "Just Dance", "Lady Gaga", "4:01", "jd.mp3")
            .unwrap()
            .with_transitions(vec![rule("exact", "17"), rule("other", "4"), rule("wild", "ANY")]);
        let target = SongId::new("17");

        let names: Vec<_> = song.available_transitions_to(&target).map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["exact", "wild"]);
    }
}
