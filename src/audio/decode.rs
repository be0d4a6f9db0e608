use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::DecodeError;

/// One decoded reference channel of an audio file. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct AudioTrack {
    sample_rate: u32,
    samples: Vec<i16>,
}

impl AudioTrack {
    pub fn from_samples(sample_rate: u32, samples: Vec<i16>) -> Self {
        assert!(sample_rate > 0, "sample rate must be positive");
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn total_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples in `[start, end)`, clamped to the track. A range that runs off
    /// either end yields a shorter slice, never an error.
    pub fn slice(&self, start: i64, end: i64) -> &[i16] {
        let len = self.samples.len() as i64;
        let start = start.clamp(0, len) as usize;
        let end = end.clamp(0, len) as usize;
        if start >= end {
            return &[];
        }
        &self.samples[start..end]
    }
}

/// Decode `path` and keep the first channel of every frame.
pub fn load(path: &Path) -> Result<AudioTrack, DecodeError> {
    let file = std::fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(DecodeError::Probe)?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|&sr| sr > 0)
        .ok_or(DecodeError::UnknownSampleRate)?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(DecodeError::Codec)?;

    let mut reference: Vec<i16> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(DecodeError::Decode(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(DecodeError::Decode(e)),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<i16>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        // First channel only
        reference.extend(sample_buf.samples().iter().step_by(channels).copied());
    }

    let track = AudioTrack::from_samples(sample_rate, reference);
    log::info!(
        "Decoded audio: {} samples, {}Hz, {:.1}s ({} channel(s) in source)",
        track.total_samples(),
        sample_rate,
        track.duration_secs(),
        channels
    );

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<i16>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn loads_first_channel_of_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<Vec<i16>> = (0..1000).map(|i| vec![i as i16, -7]).collect();
        write_wav(&path, 2, 8000, &frames);

        let track = load(&path).unwrap();
        assert_eq!(track.sample_rate(), 8000);
        assert_eq!(track.total_samples(), 1000);
        assert_eq!(track.slice(0, 3), &[0, 1, 2]);
        assert_eq!(track.slice(997, 1000), &[997, 998, 999]);
    }

    #[test]
    fn loads_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let frames: Vec<Vec<i16>> = (0..441).map(|i| vec![(i * 10) as i16]).collect();
        write_wav(&path, 1, 44100, &frames);

        let track = load(&path).unwrap();
        assert_eq!(track.sample_rate(), 44100);
        assert_eq!(track.total_samples(), 441);
        assert!((track.duration_secs() - 0.01).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_open_error() {
        let err = load(Path::new("/nonexistent/track.mp3")).unwrap_err();
        assert!(matches!(err, DecodeError::Open { .. }));
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "definitely not audio").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn slice_clamps_to_track_bounds() {
        let track = AudioTrack::from_samples(10, (0..10).collect());
        assert_eq!(track.slice(-5, 3), &[0, 1, 2]);
        assert_eq!(track.slice(8, 20), &[8, 9]);
        assert_eq!(track.slice(12, 20), &[] as &[i16]);
        assert_eq!(track.slice(5, 5), &[] as &[i16]);
        assert_eq!(track.slice(-20, -10), &[] as &[i16]);
        assert_eq!(track.slice(0, 10).len(), 10);
    }
}
