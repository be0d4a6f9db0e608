use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::ResumeCache;
use crate::player::backend::Playback;
use crate::player::position::{PositionEvent, PositionTracker};
use crate::visualizer::engine::{TickOutcome, VisualizationEngine};
use crate::visualizer::scheduler::{Scheduler, TickToken};

const POSITION_INTERVAL: Duration = Duration::from_secs(1);

/// User commands, one per stdin line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    TogglePlay,
    Seek(u64),
    SeekBy(i64),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        let mut parts = line.split_whitespace();
        let cmd = match parts.next()? {
            "p" | "pause" | "play" => Command::TogglePlay,
            "q" | "quit" => Command::Quit,
            "+" => Command::SeekBy(10),
            "-" => Command::SeekBy(-10),
            "s" | "seek" => Command::Seek(parts.next()?.parse().ok()?),
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(cmd)
    }
}

/// Playback state of one track: the external player, the one-second position
/// clock, the resume cache, and the visualization that follows them.
///
/// Without an engine (the track could not be decoded) the session plays audio
/// only.
pub struct PlayerSession<P: Playback, V: Scheduler, T: Scheduler> {
    track_path: PathBuf,
    key: String,
    backend: P,
    engine: Option<VisualizationEngine<V>>,
    position: PositionTracker,
    position_timer: T,
    position_token: Option<TickToken>,
    cache: Option<ResumeCache>,
    playing: bool,
}

impl<P: Playback, V: Scheduler, T: Scheduler> PlayerSession<P, V, T> {
    pub fn new(
        track_path: &Path,
        duration: u64,
        engine: Option<VisualizationEngine<V>>,
        backend: P,
        position_timer: T,
        cache: Option<ResumeCache>,
    ) -> Self {
        let key = ResumeCache::key_for(track_path);
        let resume = cache.as_ref().and_then(|c| c.get(&key)).unwrap_or(0);
        Self {
            track_path: track_path.to_path_buf(),
            key,
            backend,
            engine,
            position: PositionTracker::new(duration, resume),
            position_timer,
            position_token: None,
            cache,
            playing: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn playing_time(&self) -> u64 {
        self.position.playing_time()
    }

    pub fn duration(&self) -> u64 {
        self.position.duration()
    }

    pub fn label(&self) -> String {
        self.position.label()
    }

    /// Position label with a pause marker while stopped.
    pub fn status_label(&self) -> String {
        if self.is_playing() {
            self.position.label()
        } else {
            format!("|| {}", self.position.label())
        }
    }

    pub fn engine(&self) -> Option<&VisualizationEngine<V>> {
        self.engine.as_ref()
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        if !self.playing {
            if self.backend.is_active() {
                return Ok(());
            }
            self.playing = true;
            self.visual_update(self.position.playing_time());
            if let Err(err) = self.play() {
                self.playing = false;
                self.visual_stop();
                return Err(err);
            }
            self.position_token = Some(self.position_timer.start(POSITION_INTERVAL));
        } else {
            self.playing = false;
            let was_active = self.backend.is_active();
            self.stop_music();
            self.visual_stop();
            if was_active {
                self.save()?;
            }
            log::info!("Paused at {}", self.label());
        }
        Ok(())
    }

    /// Move to `secs`. While the player runs this restarts it there; otherwise
    /// only the stored position changes.
    pub fn seek(&mut self, secs: u64) -> Result<()> {
        let secs = secs.min(self.position.duration());
        if self.backend.is_active() {
            if secs == self.position.playing_time() {
                return Ok(());
            }
            self.stop_music();
            self.position.set(secs);
            if let Err(err) = self.save().and_then(|()| self.play()) {
                self.playing = false;
                self.visual_stop();
                return Err(err);
            }
            self.position_token = Some(self.position_timer.start(POSITION_INTERVAL));
            self.visual_update(secs);
        } else {
            self.position.set(secs);
            self.save()?;
        }
        log::info!("Seek to {}", self.label());
        if let Some(engine) = &self.engine {
            log::debug!(
                "Visualizer {} at {:.2}s",
                if engine.is_running() { "running" } else { "idle" },
                engine.position_secs()
            );
        }
        Ok(())
    }

    pub fn seek_by(&mut self, delta: i64) -> Result<()> {
        let target = (self.position.playing_time() as i64).saturating_add(delta).max(0);
        self.seek(target as u64)
    }

    pub fn on_visual_tick(&mut self, token: TickToken) -> TickOutcome {
        match self.engine.as_mut() {
            Some(engine) => engine.tick(token),
            None => TickOutcome::Stale,
        }
    }

    /// One second of playback has elapsed. `None` for a stale fire.
    pub fn on_position_tick(&mut self, token: TickToken) -> Option<PositionEvent> {
        if self.position_token != Some(token) {
            return None;
        }
        let event = self.position.advance();
        if event == PositionEvent::Finished {
            log::info!("End of track");
            self.stop_music();
            self.visual_stop();
            self.playing = false;
            self.position.reset();
            if let Err(err) = self.save() {
                log::warn!("{:#}", err);
            }
        }
        Some(event)
    }

    pub fn close(&mut self) -> Result<()> {
        self.stop_music();
        self.visual_stop();
        self.playing = false;
        if self.position.playing_time() != 0 {
            self.save()?;
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if let Some(resume) = self.cache.as_ref().and_then(|c| c.get(&self.key)) {
            self.position.set(resume);
            self.visual_update(resume);
        }
        self.backend
            .start(&self.track_path, self.position.playing_time())
            .with_context(|| format!("Failed to play {}", self.track_path.display()))
    }

    fn stop_music(&mut self) {
        self.backend.stop();
        self.position_timer.stop();
        self.position_token = None;
    }

    fn visual_update(&mut self, secs: u64) {
        if let Some(engine) = self.engine.as_mut() {
            engine.update(secs as f64);
        }
    }

    fn visual_stop(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
    }

    fn save(&self) -> Result<()> {
        match &self.cache {
            Some(cache) => cache.set(&self.key, self.position.playing_time()),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    fn backend(&self) -> &P {
        &self.backend
    }

    #[cfg(test)]
    fn position_timer(&self) -> &T {
        &self.position_timer
    }
}
