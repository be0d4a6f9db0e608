use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Something that can play a file from a given offset in the background.
pub trait Playback {
    fn start(&mut self, path: &Path, at_secs: u64) -> Result<()>;
    /// Stop playback; a no-op when nothing is playing.
    fn stop(&mut self);
    fn is_active(&mut self) -> bool;
}

impl<P: Playback + ?Sized> Playback for Box<P> {
    fn start(&mut self, path: &Path, at_secs: u64) -> Result<()> {
        (**self).start(path, at_secs)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn is_active(&mut self) -> bool {
        (**self).is_active()
    }
}

/// Pretends to play. Used with `--mute` so the position clock and
/// visualization still run.
#[derive(Debug, Default)]
pub struct SilentPlayback {
    active: bool,
}

impl Playback for SilentPlayback {
    fn start(&mut self, path: &Path, at_secs: u64) -> Result<()> {
        log::info!("Muted playback: {} at {}s", path.display(), at_secs);
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&mut self) -> bool {
        self.active
    }
}

/// Plays through an external ffplay-compatible process.
pub struct FfplayBackend {
    program: String,
    extra_args: Vec<String>,
    child: Option<Child>,
}

impl FfplayBackend {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
            child: None,
        }
    }

    fn args(&self, path: &Path, at_secs: u64) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            path.to_string_lossy().into_owned(),
            "-nodisp".into(),
            "-autoexit".into(),
            "-loglevel".into(),
            "quiet".into(),
            "-ss".into(),
            at_secs.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl Playback for FfplayBackend {
    fn start(&mut self, path: &Path, at_secs: u64) -> Result<()> {
        self.stop();

        let child = Command::new(&self.program)
            .args(self.args(path, at_secs))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}. Is it installed?", self.program))?;

        log::info!("Player started: {} at {}s (pid {})", path.display(), at_secs, child.id());
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(err) = child.kill() {
            // Already exited on its own
            log::debug!("Player kill: {}", err);
        }
        match child.wait() {
            Ok(status) => log::info!("Player stopped ({})", status),
            Err(err) => log::warn!("Failed to reap player process: {}", err),
        }
    }

    fn is_active(&mut self) -> bool {
        match self.child.as_mut().map(|c| c.try_wait()) {
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                log::debug!("Player exited ({})", status);
                self.child = None;
                false
            }
            Some(Err(err)) => {
                log::warn!("Failed to poll player process: {}", err);
                false
            }
            None => false,
        }
    }
}

impl Drop for FfplayBackend {
    fn drop(&mut self) {
        self.stop();
    }
}
