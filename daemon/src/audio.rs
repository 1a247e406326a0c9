/// Clip playback on the default output device.
///
/// The whole clip is decoded up front with Symphonia into interleaved `f32`,
/// converted to the device's channel layout and sample rate, scaled by the
/// requested gain, and then streamed through CPAL. [`ClipSink::play_file`]
/// blocks until the last sample has been handed to the device.
///
/// Decoding works everywhere; output is only wired up on Windows.
use std::fs::File;
use std::io;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::player::{AudioSink, PlaybackError};

impl From<SymphoniaError> for PlaybackError {
    fn from(e: SymphoniaError) -> Self {
        match e {
            SymphoniaError::IoError(e) => PlaybackError::Io(e),
            other => PlaybackError::Decode(other.to_string()),
        }
    }
}

/// A fully decoded clip.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClip {
    /// Interleaved samples: [L0, R0, L1, R1, …]
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedClip {
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / u64::from(self.sample_rate)
    }
}

/// Decodes the first audio track of the file at `path`.
pub fn decode_file(path: &Path) -> Result<DecodedClip, PlaybackError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let (track_id, params) = {
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(PlaybackError::MissingTrack)?;
        (track.id, track.codec_params.clone())
    };
    let mut decoder = symphonia::default::get_codecs().make(&params, &DecoderOptions::default())?;

    let mut samples = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut layout: Option<(u16, u32)> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(audio_buf) => {
                let spec = *audio_buf.spec();
                let capacity = audio_buf.capacity();
                let needs_realloc = sample_buf
                    .as_ref()
                    .map_or(true, |buf| buf.capacity() < capacity);
                if needs_realloc {
                    sample_buf = Some(SampleBuffer::<f32>::new(capacity as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(audio_buf);
                    samples.extend_from_slice(buf.samples());
                }
                layout = Some((spec.channels.count() as u16, spec.rate));
            }
            // A corrupt packet is skipped; the rest of the clip still plays.
            Err(SymphoniaError::DecodeError(e)) => debug!("Skipping bad packet in {}: {e}", path.display()),
            Err(e) => return Err(e.into()),
        }
    }

    let (channels, sample_rate) = layout.ok_or(PlaybackError::MissingTrack)?;
    Ok(DecodedClip {
        samples,
        channels,
        sample_rate,
    })
}

/// Converts `clip` to `channels` × `sample_rate` and applies `gain`.
pub fn prepare(clip: &DecodedClip, channels: u16, sample_rate: u32, gain: f32) -> Vec<f32> {
    let gain = gain.clamp(0.0, 1.0);
    let remixed = remix(&clip.samples, clip.channels, channels);
    let mut out = resample(&remixed, channels, clip.sample_rate, sample_rate);
    for s in &mut out {
        *s = (*s * gain).clamp(-1.0, 1.0);
    }
    out
}

/// Mono is duplicated to every output channel and averaged when the output
/// is mono. Otherwise channels map by index and extra outputs stay silent.
fn remix(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    let from = usize::from(from.max(1));
    let to = usize::from(to.max(1));
    if from == to {
        return samples.to_vec();
    }

    let mut out = Vec::with_capacity(samples.len() / from * to);
    for frame in samples.chunks_exact(from) {
        if to == 1 {
            out.push(frame.iter().sum::<f32>() / from as f32);
            continue;
        }
        for c in 0..to {
            out.push(match (from, frame.get(c)) {
                (1, _) => frame[0],
                (_, Some(v)) => *v,
                (_, None) => 0.0,
            });
        }
    }
    out
}

/// Linear-interpolation resampler over interleaved frames.
fn resample(samples: &[f32], channels: u16, from_rate: u32, to_rate: u32) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if from_rate == to_rate || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let in_frames = samples.len() / channels;
    if in_frames == 0 {
        return Vec::new();
    }
    let step = f64::from(from_rate) / f64::from(to_rate);
    let out_frames = (in_frames as f64 / step).ceil() as usize;
    let last = in_frames - 1;

    let mut out = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        let pos = i as f64 * step;
        let i0 = (pos.floor() as usize).min(last);
        let i1 = (i0 + 1).min(last);
        let frac = (pos - i0 as f64) as f32;
        for c in 0..channels {
            let a = samples[i0 * channels + c];
            let b = samples[i1 * channels + c];
            out.push(a + (b - a) * frac);
        }
    }
    out
}

/// [`AudioSink`] that plays clips on the system's default output device.
#[derive(Debug, Default)]
pub struct ClipSink;

impl AudioSink for ClipSink {
    fn play_file(&self, path: &Path, gain: f32) -> Result<(), PlaybackError> {
        let clip = decode_file(path)?;
        debug!(
            "Decoded {} ({}ch @ {}Hz, {} ms)",
            path.display(),
            clip.channels,
            clip.sample_rate,
            clip.duration_ms()
        );
        output::play(&clip, gain)
    }
}

// ── Windows output ────────────────────────────────────────────────────────────

#[cfg(windows)]
mod output {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SizedSample};
    use tracing::warn;

    use super::{prepare, DecodedClip};
    use crate::player::PlaybackError;

    /// Completion is polled at this resolution.
    const POLL_INTERVAL: Duration = Duration::from_millis(100);
    /// Extra wait past the clip's nominal length before giving up on the device.
    const DRAIN_GRACE: Duration = Duration::from_secs(2);

    pub fn play(clip: &DecodedClip, gain: f32) -> Result<(), PlaybackError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;
        let supported = device
            .default_output_config()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let samples = Arc::new(prepare(clip, channels, sample_rate, gain));
        let total = samples.len();
        let cursor = Arc::new(AtomicUsize::new(0));
        let config: cpal::StreamConfig = supported.config();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => build::<f32>(&device, &config, Arc::clone(&samples), Arc::clone(&cursor))?,
            cpal::SampleFormat::I16 => build::<i16>(&device, &config, Arc::clone(&samples), Arc::clone(&cursor))?,
            cpal::SampleFormat::U16 => build::<u16>(&device, &config, Arc::clone(&samples), Arc::clone(&cursor))?,
            other => {
                return Err(PlaybackError::Device(format!(
                    "unsupported output sample format: {other:?}"
                )))
            }
        };
        stream.play().map_err(|e| PlaybackError::Device(e.to_string()))?;

        let frames = total / usize::from(channels.max(1));
        let nominal = Duration::from_millis(frames as u64 * 1000 / u64::from(sample_rate.max(1)));
        let deadline = Instant::now() + nominal + DRAIN_GRACE;

        while cursor.load(Ordering::Acquire) < total {
            if Instant::now() >= deadline {
                warn!("Output device stalled; abandoning clip");
                break;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        // Let the device play out its last buffer before the stream is dropped.
        std::thread::sleep(POLL_INTERVAL);
        Ok(())
    }

    fn build<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        samples: Arc<Vec<f32>>,
        cursor: Arc<AtomicUsize>,
    ) -> Result<cpal::Stream, PlaybackError>
    where
        T: SizedSample + FromSample<f32>,
    {
        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let start = cursor.load(Ordering::Relaxed);
                    for (i, slot) in data.iter_mut().enumerate() {
                        *slot = match samples.get(start + i) {
                            Some(v) => T::from_sample(*v),
                            None => T::EQUILIBRIUM,
                        };
                    }
                    cursor.store((start + data.len()).min(samples.len()), Ordering::Release);
                },
                |err| warn!("Output stream error: {err}"),
                None,
            )
            .map_err(|e| PlaybackError::Device(e.to_string()))
    }
}

#[cfg(not(windows))]
mod output {
    use super::DecodedClip;
    use crate::player::PlaybackError;

    pub fn play(clip: &DecodedClip, gain: f32) -> Result<(), PlaybackError> {
        let _ = (clip, gain);
        Err(PlaybackError::Unsupported("clip playback"))
    }
}
