//! Song catalog loaded once at startup

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::song::{SongId, SongMetadata, TransitionRule, parse_clock};
use crate::error::{CatalogError, Result};

const BUNDLED_CATALOG: &str = include_str!("../../assets/catalog.json");

#[derive(Debug, Deserialize)]
struct TransitionRecord {
    name: String,
    target: String,
    #[serde(default)]
    label: Option<String>,
    cut_point: String,
    resume_point: String,
    audio_file: String,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    clip_length: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    id: String,
    title: String,
    #[serde(default)]
    artist: String,
    duration: String,
    audio_file: String,
    #[serde(default)]
    transitions: Vec<TransitionRecord>,
}

impl TryFrom<TransitionRecord> for TransitionRule {
    type Error = CatalogError;

    fn try_from(record: TransitionRecord) -> Result<Self> {
        let mut rule = TransitionRule::new(
            record.name,
            &record.target,
            &record.cut_point,
            &record.resume_point,
            record.audio_file,
        )?;
        if let Some(label) = record.label {
            rule = rule.with_label(label);
        }
        if let Some(length) = record.clip_length {
            rule = rule.with_clip_length(parse_clock(&length)?);
        }
        if record.default {
            rule = rule.as_default();
        }
        Ok(rule)
    }
}

impl TryFrom<CatalogRecord> for SongMetadata {
    type Error = CatalogError;

    fn try_from(record: CatalogRecord) -> Result<Self> {
        let transitions = record
            .transitions
            .into_iter()
            .map(TransitionRule::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(SongMetadata::new(
            record.id,
            record.title,
            record.artist,
            &record.duration,
            record.audio_file,
        )?
        .with_transitions(transitions))
    }
}

/// Ordered, read-only list of the songs that can be placed on the canvas
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    songs: Vec<Arc<SongMetadata>>,
}

impl Catalog {
    pub fn new(songs: Vec<SongMetadata>) -> Result<Self> {
        let mut seen = HashSet::new();
        for song in &songs {
            if !seen.insert(song.id.clone()) {
                return Err(CatalogError::DuplicateSong(song.id.to_string()));
            }
        }
        Ok(Self {
            songs: songs.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let records: Vec<CatalogRecord> = serde_json::from_str(content)?;
        let songs = records
            .into_iter()
            .map(SongMetadata::try_from)
            .collect::<Result<Vec<_>>>()?;
        Self::new(songs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        tracing::info!(path = %path.display(), songs = catalog.len(), "Catalog loaded");
        Ok(catalog)
    }

    /// The catalog shipped with the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn get(&self, id: &SongId) -> Option<&Arc<SongMetadata>> {
        self.songs.iter().find(|song| &song.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SongMetadata>> {
        self.songs.iter()
    }

    pub fn songs(&self) -> &[Arc<SongMetadata>] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
