use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};

/// Opaque identifier for captions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptionId(String);

impl CaptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CaptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timed text overlay. Times are in seconds of playback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    pub id: CaptionId,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

impl Caption {
    /// Returns true when `t` lies in `[start_time, end_time]`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t <= self.end_time
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Allocates caption ids from wall-clock milliseconds.
///
/// Ids never repeat within one generator even when the clock stalls or
/// steps backwards.
#[derive(Debug, Clone, Default)]
pub struct CaptionIdGenerator {
    last: Option<u64>,
}

impl CaptionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id for the current wall clock.
    pub fn next_id(&mut self) -> CaptionId {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or(0);
        self.next_at(now_ms)
    }

    /// Returns the next id for a given clock reading in milliseconds.
    ///
    /// # Example
    /// ```
    /// use engine::CaptionIdGenerator;
    ///
    /// let mut ids = CaptionIdGenerator::new();
    /// assert_eq!(ids.next_at(1_700).as_str(), "1700");
    /// assert_eq!(ids.next_at(1_700).as_str(), "1701");
    /// ```
    pub fn next_at(&mut self, now_ms: u64) -> CaptionId {
        let value = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(value);
        CaptionId(value.to_string())
    }
}

/// Caption list in insertion order.
///
/// No ordering or overlap invariants are kept: ranges may overlap and a
/// caption may end before it starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    captions: Vec<Caption>,
}

impl CaptionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.captions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    pub fn as_slice(&self) -> &[Caption] {
        &self.captions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Caption> {
        self.captions.iter()
    }

    pub fn get(&self, id: &CaptionId) -> Option<&Caption> {
        self.captions.iter().find(|caption| &caption.id == id)
    }

    /// Appends a caption spanning `[start_time, start_time + duration]`.
    pub fn add(
        &mut self,
        id: CaptionId,
        text: impl Into<String>,
        start_time: f64,
        duration: f64,
    ) -> &Caption {
        let caption = Caption {
            id,
            start_time,
            end_time: start_time + duration,
            text: text.into(),
        };
        debug!(
            caption_id = %caption.id,
            start_time = caption.start_time,
            end_time = caption.end_time,
            caption_count = self.captions.len() + 1,
            "caption added"
        );
        let index = self.captions.len();
        self.captions.push(caption);
        &self.captions[index]
    }

    pub fn update_text(&mut self, id: &CaptionId, text: impl Into<String>) -> Result<()> {
        self.find_mut(id)?.text = text.into();
        Ok(())
    }

    pub fn update_start_time(&mut self, id: &CaptionId, start_time: f64) -> Result<()> {
        let caption = self.find_mut(id)?;
        caption.start_time = start_time;
        debug!(caption_id = %id, start_time, "caption start updated");
        Ok(())
    }

    pub fn update_end_time(&mut self, id: &CaptionId, end_time: f64) -> Result<()> {
        let caption = self.find_mut(id)?;
        caption.end_time = end_time;
        debug!(caption_id = %id, end_time, "caption end updated");
        Ok(())
    }

    /// Removes the caption with `id` and returns it.
    pub fn delete(&mut self, id: &CaptionId) -> Result<Caption> {
        let index = self
            .captions
            .iter()
            .position(|caption| &caption.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = self.captions.remove(index);
        debug!(
            caption_id = %removed.id,
            caption_count = self.captions.len(),
            "caption deleted"
        );
        Ok(removed)
    }

    /// Selects the caption to overlay at playback time `t`.
    ///
    /// Bounds are inclusive on both ends. When ranges overlap the earliest
    /// inserted caption wins.
    ///
    /// # Example
    /// ```
    /// use engine::{CaptionId, CaptionTrack};
    ///
    /// let mut track = CaptionTrack::new();
    /// track.add(CaptionId::new("a"), "hello", 1.0, 5.0);
    ///
    /// assert_eq!(track.active_at(6.0).map(|c| c.text.as_str()), Some("hello"));
    /// assert!(track.active_at(6.5).is_none());
    /// ```
    pub fn active_at(&self, t: f64) -> Option<&Caption> {
        self.captions.iter().find(|caption| caption.contains(t))
    }

    fn find_mut(&mut self, id: &CaptionId) -> Result<&mut Caption> {
        self.captions
            .iter_mut()
            .find(|caption| &caption.id == id)
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &CaptionId) -> EngineError {
    warn!(caption_id = %id, "caption operation rejected: unknown id");
    EngineError::CaptionNotFound { id: id.clone() }
}
