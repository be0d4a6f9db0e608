mod app;
mod audio;
mod cache;
mod cli;
mod config;
mod error;
mod event_loop;
mod media;
mod player;
mod render;
mod visualizer;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::Path;
use std::sync::mpsc::{self, Sender};

use app::{Command, PlayerSession};
use cache::ResumeCache;
use cli::Cli;
use config::Config;
use event_loop::{Event, EventLoop};
use media::probe::{FfmpegTools, MetadataProvider};
use player::backend::{FfplayBackend, Playback, SilentPlayback};
use player::position::PositionEvent;
use render::terminal::{Renderer, TerminalRenderer};
use visualizer::engine::{TickOutcome, VisualizationEngine};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::find_config);
    let mut config = Config::default();
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            config = cfg;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    // Config values apply only when the CLI flag is at its default
    if cli.tick_ms == config::default_tick_ms() {
        cli.tick_ms = config.visualizer.tick_ms;
    }
    if cli.player == config::default_player() {
        cli.player = config.player.program.clone();
    }
    if cli.columns == config::default_columns() {
        cli.columns = config.visualizer.columns;
    }
    config.visualizer.tick_ms = cli.tick_ms;

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("pulseplay - {}", input.display());

    // 1. Decode the reference channel for the visualizer
    let track = match audio::decode::load(input) {
        Ok(track) => Some(track),
        Err(err) => {
            log::error!("Cannot visualize {}: {}; playing audio only", input.display(), err);
            None
        }
    };

    // 2. Metadata from the external tools
    let tools = FfmpegTools::new(
        config.probe.ffprobe.clone(),
        config.probe.ffmpeg.clone(),
        config.probe.default_duration,
    );
    let duration = tools.duration(input);

    // 3. Resume cache and cover art
    let cache_dir = config.cache.dir.clone().or_else(ResumeCache::default_dir);
    let cache = cache_dir.as_deref().and_then(|dir| match ResumeCache::open(dir) {
        Ok(cache) => Some(cache),
        Err(err) => {
            log::warn!("Resume cache disabled: {:#}", err);
            None
        }
    });
    if cli.forget {
        if let Some(ref cache) = cache {
            cache.forget(&ResumeCache::key_for(input))?;
        }
    }
    if let Some(ref cache) = cache {
        log::info!("Resume cache: {}", cache.path().display());
    }
    if let Some(ref out) = cli.cover_out {
        export_cover(&tools, cache_dir.as_deref(), input, out);
    }

    // 4. Wire the session onto the event loop
    let (tx, rx) = mpsc::channel();
    spawn_command_reader(tx);
    let mut event_loop = EventLoop::new(rx);
    let visual_timer = event_loop.timer();
    let position_timer = event_loop.timer();
    let visual_id = visual_timer.id();
    let position_id = position_timer.id();

    let engine = track.map(|track| {
        VisualizationEngine::new(track, config.visualizer.engine_settings(), visual_timer)
    });
    let backend: Box<dyn Playback> = if cli.mute {
        Box::new(SilentPlayback::default())
    } else {
        Box::new(FfplayBackend::new(cli.player.clone(), config.player.extra_args.clone()))
    };
    let mut session = PlayerSession::new(input, duration, engine, backend, position_timer, cache);

    if let Some(start) = cli.start {
        session.seek(start)?;
    }

    if let Some(engine) = session.engine() {
        let window = engine.window();
        log::info!(
            "Visualizer: {} bins from {}-sample windows, refresh every {}ms",
            window.transform_size,
            window.window_size,
            cli.tick_ms
        );
    }

    let mut renderer =
        TerminalRenderer::new(session.duration(), cli.columns, config.visualizer.y_limit);
    renderer.status(session.playing_time(), &session.status_label());
    log::info!("Commands: p = play/pause, s SECS = seek, +/- = skip 10s, q = quit");

    session.toggle_play_pause()?;
    if let Some(engine) = session.engine() {
        renderer.draw(engine.frequency_axis(), engine.current_frame());
    }
    renderer.status(session.playing_time(), &session.status_label());

    // 5. Run until quit or end of track
    while let Some(event) = event_loop.next_event() {
        match event {
            Event::Timer(id, token) if id == visual_id => {
                if let TickOutcome::Frame(frame) = session.on_visual_tick(token) {
                    if let Some(engine) = session.engine() {
                        renderer.draw(engine.frequency_axis(), &frame);
                    }
                }
            }
            Event::Timer(id, token) if id == position_id => match session.on_position_tick(token) {
                Some(PositionEvent::Advanced(secs)) => renderer.status(secs, &session.status_label()),
                Some(PositionEvent::Finished) => break,
                None => {}
            },
            Event::Timer(..) => {}
            Event::Command(Command::Quit) => break,
            Event::Command(cmd) => {
                let result = match cmd {
                    Command::TogglePlay => session.toggle_play_pause(),
                    Command::Seek(secs) => session.seek(secs),
                    Command::SeekBy(delta) => session.seek_by(delta),
                    Command::Quit => Ok(()),
                };
                if let Err(err) = result {
                    log::error!("{:#}", err);
                }
                renderer.status(session.playing_time(), &session.status_label());
            }
        }
    }

    session.close()?;
    renderer.finish();
    log::info!("Stopped at {}", session.label());
    Ok(())
}

fn spawn_command_reader(tx: Sender<Command>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => log::warn!("Unknown command: {:?}", line.trim()),
            }
        }
    });
}

fn export_cover(tools: &dyn MetadataProvider, cache_dir: Option<&Path>, input: &Path, out: &Path) {
    let result = match cache_dir {
        Some(dir) => match media::cover::cached_cover(tools, dir, input) {
            Some(path) => std::fs::copy(&path, out).map(|_| ()),
            None => return,
        },
        None => match tools.cover_image(input) {
            Some(bytes) => std::fs::write(out, bytes),
            None => return,
        },
    };
    match result {
        Ok(()) => log::info!("Cover art written to {}", out.display()),
        Err(err) => log::warn!("Failed to write cover art to {}: {}", out.display(), err),
    }
}
