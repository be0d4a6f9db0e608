use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pulseplay", about = "Terminal music player with a live spectrum")]
pub struct Cli {
    /// Audio file to play (WAV, MP3, FLAC, OGG, AAC)
    pub input: Option<PathBuf>,

    /// Config file (default: ./pulseplay.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Start position in seconds; overrides the saved resume position
    #[arg(short, long)]
    pub start: Option<u64>,

    /// Visualization refresh interval in milliseconds
    #[arg(long, default_value_t = 19)]
    pub tick_ms: u64,

    /// External player program (ffplay-compatible arguments)
    #[arg(long, default_value = "ffplay")]
    pub player: String,

    /// Visualize only; don't spawn the player
    #[arg(long)]
    pub mute: bool,

    /// Drop the saved resume position for this track before starting
    #[arg(long)]
    pub forget: bool,

    /// Copy the extracted cover art to this path
    #[arg(long)]
    pub cover_out: Option<PathBuf>,

    /// Width of the spectrum line in terminal cells
    #[arg(long, default_value_t = 64)]
    pub columns: usize,
}
