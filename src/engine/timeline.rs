// Knoux Timeline Operations
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Clip editing and transport control on a `ProjectState`.
// Invariants kept by every mutation:
//   * clips inside a track are ordered by `start_time`,
//   * `timeline.duration` covers the end of every clip,
//   * locked tracks are never modified.

use serde_json::Value;
use thiserror::Error;

use super::project::{AiSettings, Clip, Effect, ProjectState, Track};

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("Track not found: {0}")]
    TrackNotFound(String),
    #[error("Clip not found: {0}")]
    ClipNotFound(String),
    #[error("Track is locked: {0}")]
    TrackLocked(String),
    #[error("Invalid clip: {0}")]
    InvalidClip(String),
    #[error("Invalid property '{property}': {reason}")]
    InvalidProperty { property: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Seek(f64),
    Volume(f64),
}

impl ProjectState {
    pub fn track(&self, track_id: &str) -> Option<&Track> {
        self.timeline.tracks.iter().find(|t| t.id == track_id)
    }

    /// The clip and the id of the track holding it.
    pub fn find_clip(&self, clip_id: &str) -> Option<(&str, &Clip)> {
        self.timeline.tracks.iter().find_map(|t| {
            t.clips
                .iter()
                .find(|c| c.id == clip_id)
                .map(|c| (t.id.as_str(), c))
        })
    }

    /// Inserts `clip` on `track_id` and returns its id (generated when empty).
    pub fn add_clip(&mut self, track_id: &str, mut clip: Clip) -> Result<String, TimelineError> {
        validate_time("startTime", clip.start_time, false)
            .and_then(|_| validate_time("duration", clip.duration, true))
            .map_err(|e| TimelineError::InvalidClip(e.to_string()))?;

        if clip.id.is_empty() {
            clip.id = format!("clip-{}", uuid::Uuid::new_v4());
        } else if self.find_clip(&clip.id).is_some() {
            return Err(TimelineError::InvalidClip(format!("duplicate clip id {}", clip.id)));
        }

        let track = self.unlocked_track_mut(track_id)?;
        let id = clip.id.clone();
        let end = clip.end_time();
        insert_sorted(track, clip);
        self.cover(end);
        self.touch();
        Ok(id)
    }

    pub fn remove_clip(&mut self, clip_id: &str) -> Result<Clip, TimelineError> {
        let (t, c) = self.locate(clip_id)?;
        let track = &mut self.timeline.tracks[t];
        if track.locked {
            return Err(TimelineError::TrackLocked(track.id.clone()));
        }
        let clip = track.clips.remove(c);
        self.touch();
        Ok(clip)
    }

    pub fn move_clip(&mut self, clip_id: &str, new_time: f64, new_track_id: &str) -> Result<(), TimelineError> {
        validate_time("startTime", new_time, false)?;
        let (t, c) = self.locate(clip_id)?;
        if self.timeline.tracks[t].locked {
            return Err(TimelineError::TrackLocked(self.timeline.tracks[t].id.clone()));
        }
        // Check the destination before detaching anything.
        self.unlocked_track_mut(new_track_id)?;

        let mut clip = self.timeline.tracks[t].clips.remove(c);
        clip.start_time = new_time;
        let end = clip.end_time();
        let target = self.unlocked_track_mut(new_track_id)?;
        insert_sorted(target, clip);
        self.cover(end);
        self.touch();
        Ok(())
    }

    /// Sets one property by its editor path: `name`, `startTime`, `duration`,
    /// `opacity`, `blendMode`, `effects`, `aiSettings` or `transform.<field>`.
    pub fn update_clip_property(&mut self, clip_id: &str, property: &str, value: &Value) -> Result<(), TimelineError> {
        let (t, c) = self.locate(clip_id)?;
        if self.timeline.tracks[t].locked {
            return Err(TimelineError::TrackLocked(self.timeline.tracks[t].id.clone()));
        }

        let clip = &mut self.timeline.tracks[t].clips[c];
        let mut resort = false;
        match property {
            "name" => clip.name = as_str(property, value)?.to_string(),
            "startTime" => {
                let v = as_f64(property, value)?;
                validate_time(property, v, false)?;
                clip.start_time = v;
                resort = true;
            }
            "duration" => {
                let v = as_f64(property, value)?;
                validate_time(property, v, true)?;
                clip.duration = v;
            }
            "opacity" => clip.properties.opacity = as_f64(property, value)?.clamp(0.0, 1.0),
            "blendMode" => clip.properties.blend_mode = as_str(property, value)?.to_string(),
            "effects" => {
                clip.properties.effects = serde_json::from_value::<Vec<Effect>>(value.clone())
                    .map_err(|e| invalid(property, e.to_string()))?;
            }
            "aiSettings" => {
                let settings = serde_json::from_value::<AiSettings>(value.clone())
                    .map_err(|e| invalid(property, e.to_string()))?;
                clip.ai_settings = Some(settings);
            }
            _ => {
                let field = property
                    .strip_prefix("transform.")
                    .ok_or_else(|| invalid(property, "unknown property".to_string()))?;
                let v = as_f64(property, value)?;
                let tr = &mut clip.properties.transform;
                match field {
                    "x" => tr.x = v,
                    "y" => tr.y = v,
                    "width" => tr.width = v,
                    "height" => tr.height = v,
                    "rotation" => tr.rotation = v,
                    "scaleX" => tr.scale_x = v,
                    "scaleY" => tr.scale_y = v,
                    _ => return Err(invalid(property, "unknown transform field".to_string())),
                }
            }
        }

        let end = clip.end_time();
        if resort {
            let track = &mut self.timeline.tracks[t];
            track.clips.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        }
        self.cover(end);
        self.touch();
        Ok(())
    }

    pub fn play(&mut self) {
        self.timeline.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.timeline.is_playing = false;
    }

    /// Moves the playhead, clamped to `[0, duration]`. Returns the new time.
    pub fn seek(&mut self, time: f64) -> Result<f64, TimelineError> {
        self.apply_playback(PlaybackCommand::Seek(time))?;
        Ok(self.timeline.current_time)
    }

    pub fn set_volume(&mut self, volume: f64) -> Result<f64, TimelineError> {
        self.apply_playback(PlaybackCommand::Volume(volume))?;
        Ok(self.timeline.volume)
    }

    pub fn apply_playback(&mut self, command: PlaybackCommand) -> Result<(), TimelineError> {
        let tl = &mut self.timeline;
        match command {
            PlaybackCommand::Play => tl.is_playing = true,
            PlaybackCommand::Pause => tl.is_playing = false,
            PlaybackCommand::Seek(t) => {
                if !t.is_finite() {
                    return Err(invalid("time", "must be a finite number".to_string()));
                }
                let t = t.clamp(0.0, tl.duration.max(0.0));
                tl.current_time = t;
                tl.playhead_position = t;
            }
            PlaybackCommand::Volume(v) => {
                if !v.is_finite() {
                    return Err(invalid("volume", "must be a finite number".to_string()));
                }
                tl.volume = v.clamp(0.0, 1.0);
            }
        }
        Ok(())
    }

    fn locate(&self, clip_id: &str) -> Result<(usize, usize), TimelineError> {
        self.timeline
            .tracks
            .iter()
            .enumerate()
            .find_map(|(t, track)| track.clips.iter().position(|c| c.id == clip_id).map(|c| (t, c)))
            .ok_or_else(|| TimelineError::ClipNotFound(clip_id.to_string()))
    }

    fn unlocked_track_mut(&mut self, track_id: &str) -> Result<&mut Track, TimelineError> {
        let track = self
            .timeline
            .tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .ok_or_else(|| TimelineError::TrackNotFound(track_id.to_string()))?;
        if track.locked {
            return Err(TimelineError::TrackLocked(track_id.to_string()));
        }
        Ok(track)
    }

    fn cover(&mut self, end: f64) {
        if end > self.timeline.duration {
            self.timeline.duration = end;
        }
    }
}

fn insert_sorted(track: &mut Track, clip: Clip) {
    let at = track
        .clips
        .partition_point(|c| c.start_time <= clip.start_time);
    track.clips.insert(at, clip);
}

fn validate_time(property: &str, v: f64, strictly_positive: bool) -> Result<(), TimelineError> {
    let ok = v.is_finite() && if strictly_positive { v > 0.0 } else { v >= 0.0 };
    if ok {
        Ok(())
    } else {
        let bound = if strictly_positive { "> 0" } else { ">= 0" };
        Err(invalid(property, format!("must be a finite number {}", bound)))
    }
}

fn as_f64(property: &str, value: &Value) -> Result<f64, TimelineError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(property, "expected a number".to_string()))
}

fn as_str<'v>(property: &str, value: &'v Value) -> Result<&'v str, TimelineError> {
    value
        .as_str()
        .ok_or_else(|| invalid(property, "expected a string".to_string()))
}

fn invalid(property: &str, reason: String) -> TimelineError {
    TimelineError::InvalidProperty { property: property.to_string(), reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::project::{ClipKind, ClipProperties};
    use serde_json::json;

    fn clip(id: &str, start: f64, duration: f64) -> Clip {
        Clip {
            id: id.to_string(),
            name: id.to_string(),
            kind: ClipKind::VideoClip,
            start_time: start,
            duration,
            properties: ClipProperties::default(),
            ai_settings: None,
            source: None,
        }
    }

    fn project() -> ProjectState {
        ProjectState::new("test")
    }

    #[test]
    fn test_add_keeps_order_and_extends_duration() {
        let mut p = project();
        p.add_clip("track-video-1", clip("b", 10.0, 5.0)).unwrap();
        p.add_clip("track-video-1", clip("a", 2.0, 3.0)).unwrap();

        let ids: Vec<_> = p.timeline.tracks[0].clips.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(p.timeline.duration, 15.0);
    }

    #[test]
    fn test_add_generates_id_and_rejects_bad_clips() {
        let mut p = project();
        let id = p.add_clip("track-video-1", clip("", 0.0, 1.0)).unwrap();
        assert!(id.starts_with("clip-"));

        assert!(matches!(
            p.add_clip("track-video-1", clip("x", -1.0, 1.0)),
            Err(TimelineError::InvalidClip(_))
        ));
        assert!(matches!(
            p.add_clip("track-video-1", clip("x", 0.0, 0.0)),
            Err(TimelineError::InvalidClip(_))
        ));
        assert!(matches!(
            p.add_clip("track-video-1", clip(&id, 4.0, 1.0)),
            Err(TimelineError::InvalidClip(_))
        ));
        assert_eq!(
            p.add_clip("nope", clip("y", 0.0, 1.0)),
            Err(TimelineError::TrackNotFound("nope".into()))
        );
    }

    #[test]
    fn test_locked_track_rejects_edits() {
        let mut p = project();
        p.add_clip("track-video-1", clip("a", 0.0, 2.0)).unwrap();
        p.timeline.tracks[0].locked = true;

        assert!(matches!(p.remove_clip("a"), Err(TimelineError::TrackLocked(_))));
        assert!(matches!(
            p.update_clip_property("a", "opacity", &json!(0.5)),
            Err(TimelineError::TrackLocked(_))
        ));
        assert!(matches!(
            p.add_clip("track-video-1", clip("b", 0.0, 1.0)),
            Err(TimelineError::TrackLocked(_))
        ));
    }

    #[test]
    fn test_move_between_tracks() {
        let mut p = project();
        p.add_clip("track-video-1", clip("a", 0.0, 2.0)).unwrap();
        p.move_clip("a", 20.0, "track-audio-1").unwrap();

        assert!(p.timeline.tracks[0].clips.is_empty());
        let (track, c) = p.find_clip("a").unwrap();
        assert_eq!(track, "track-audio-1");
        assert_eq!(c.start_time, 20.0);
        assert_eq!(p.timeline.duration, 22.0);
    }

    #[test]
    fn test_failed_move_leaves_clip_in_place() {
        let mut p = project();
        p.add_clip("track-video-1", clip("a", 1.0, 2.0)).unwrap();
        p.timeline.tracks[1].locked = true;

        assert!(matches!(p.move_clip("a", 5.0, "track-audio-1"), Err(TimelineError::TrackLocked(_))));
        assert!(matches!(p.move_clip("a", 5.0, "missing"), Err(TimelineError::TrackNotFound(_))));
        assert!(matches!(p.move_clip("a", f64::NAN, "track-video-1"), Err(TimelineError::InvalidProperty { .. })));
        let (track, c) = p.find_clip("a").unwrap();
        assert_eq!((track, c.start_time), ("track-video-1", 1.0));
    }

    #[test]
    fn test_update_properties() {
        let mut p = project();
        p.add_clip("track-video-1", clip("a", 0.0, 2.0)).unwrap();
        p.add_clip("track-video-1", clip("b", 5.0, 2.0)).unwrap();

        p.update_clip_property("a", "opacity", &json!(3.0)).unwrap();
        p.update_clip_property("a", "transform.scaleX", &json!(1.5)).unwrap();
        p.update_clip_property("a", "blendMode", &json!("multiply")).unwrap();
        p.update_clip_property("a", "startTime", &json!(9.0)).unwrap();

        let (_, a) = p.find_clip("a").unwrap();
        assert_eq!(a.properties.opacity, 1.0);
        assert_eq!(a.properties.transform.scale_x, 1.5);
        assert_eq!(a.properties.blend_mode, "multiply");
        assert_eq!(p.timeline.tracks[0].clips[1].id, "a", "clips resorted after startTime change");
        assert_eq!(p.timeline.duration, 11.0);

        assert!(matches!(
            p.update_clip_property("a", "volume", &json!(1)),
            Err(TimelineError::InvalidProperty { .. })
        ));
        assert!(matches!(
            p.update_clip_property("a", "transform.skew", &json!(1)),
            Err(TimelineError::InvalidProperty { .. })
        ));
        assert!(matches!(
            p.update_clip_property("a", "name", &json!(42)),
            Err(TimelineError::InvalidProperty { .. })
        ));
        assert_eq!(
            p.update_clip_property("ghost", "name", &json!("x")),
            Err(TimelineError::ClipNotFound("ghost".into()))
        );
    }

    #[test]
    fn test_ai_settings_property() {
        let mut p = project();
        p.add_clip("track-video-1", clip("a", 0.0, 2.0)).unwrap();
        p.update_clip_property(
            "a",
            "aiSettings",
            &json!({ "expression": { "enabled": true, "mood": "happy", "intensity": 0.7,
                     "components": { "eyebrows": 0.3, "eyes": 0.6, "mouth": 0.8, "cheeks": 0.7 } } }),
        )
        .unwrap();
        let (_, a) = p.find_clip("a").unwrap();
        assert!(a.ai_settings.as_ref().unwrap().expression.is_some());
    }

    #[test]
    fn test_playback_clamps() {
        let mut p = project();
        p.add_clip("track-video-1", clip("a", 0.0, 10.0)).unwrap();

        p.apply_playback(PlaybackCommand::Play).unwrap();
        assert!(p.timeline.is_playing);
        p.apply_playback(PlaybackCommand::Seek(42.0)).unwrap();
        assert_eq!(p.timeline.current_time, 10.0);
        p.apply_playback(PlaybackCommand::Seek(-3.0)).unwrap();
        assert_eq!(p.timeline.playhead_position, 0.0);
        p.apply_playback(PlaybackCommand::Volume(1.7)).unwrap();
        assert_eq!(p.timeline.volume, 1.0);
        assert!(p.apply_playback(PlaybackCommand::Seek(f64::INFINITY)).is_err());
        p.pause();
        assert!(!p.timeline.is_playing);
        assert_eq!(p.seek(4.0).unwrap(), 4.0);
        assert_eq!(p.set_volume(-1.0).unwrap(), 0.0);
    }
}
