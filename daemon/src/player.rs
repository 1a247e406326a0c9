/// Notification selection and dispatch.
///
/// [`NotificationPlayer::notify`] resolves what to play for a condition
/// transition and plays it: the configured clip when it is enabled and
/// readable, otherwise the configured text through the speech engine. Every
/// failure is logged and swallowed so that monitoring never stops because a
/// notification could not be played.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::condition::ConditionId;
use crate::config::Config;
use crate::detector::Direction;

/// Spoken by test playback when the configured text is empty.
pub const PREVIEW_FALLBACK_TEXT: &str = "测试语音";

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("clip has no playable audio track")]
    MissingTrack,
    #[error("no default output device")]
    NoDevice,
    #[error("output device error: {0}")]
    Device(String),
    #[error("voice '{0}' is not installed")]
    VoiceUnavailable(String),
    #[error("speech engine error: {0}")]
    Speech(String),
    #[error("{0} is only supported on Windows")]
    Unsupported(&'static str),
}

/// Plays an audio clip to completion.
pub trait AudioSink: Send + Sync {
    /// `gain` is a linear multiplier in [0.0, 1.0].
    fn play_file(&self, path: &Path, gain: f32) -> Result<(), PlaybackError>;
}

/// Speaks text to completion.
pub trait SpeechEngine: Send + Sync {
    /// Returns [`PlaybackError::VoiceUnavailable`] when `request.voice` is not installed.
    fn speak(&self, request: &SpeechRequest<'_>) -> Result<(), PlaybackError>;
    fn voices(&self) -> Result<Vec<VoiceInfo>, PlaybackError>;
}

/// An installed voice. `name` is what `voice_id` in the config refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    /// Locale name such as `zh-CN`, when the engine reports one.
    pub culture: Option<String>,
}

impl fmt::Display for VoiceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.culture {
            Some(culture) => write!(f, "{} ({culture})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
    /// 0–100.
    pub volume: u8,
    pub rate: i32,
    pub voice: Option<&'a str>,
}

/// Everything needed to play one notification, resolved from a config snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub condition: ConditionId,
    pub is_enabled: bool,
    pub text: String,
    /// Set only when the clip is enabled for this condition.
    pub audio_path: Option<PathBuf>,
    pub audio_volume: u8,
    pub speech_volume: u8,
    pub speech_rate: i32,
    pub voice: Option<String>,
}

impl NotificationRequest {
    pub fn resolve(condition: ConditionId, direction: Direction, config: &Config) -> Self {
        let settings = config.notification(condition);
        let audio_path = if settings.use_audio_file {
            settings.audio_clip(direction).map(Path::to_path_buf)
        } else {
            None
        };
        Self {
            condition,
            is_enabled: direction.is_enabled(),
            text: settings.text(condition, direction).trim().to_string(),
            audio_path,
            audio_volume: settings.audio_volume(direction),
            speech_volume: settings.speech_volume(),
            speech_rate: settings.speech_rate(),
            voice: settings.voice().map(str::to_string),
        }
    }

    /// Linear gain for the clip volume.
    pub fn gain(&self) -> f32 {
        f32::from(self.audio_volume) / 100.0
    }
}

/// What [`NotificationPlayer::play`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clip,
    Speech,
    /// Nothing to play: empty text and no usable clip.
    Silent,
    /// Something was attempted and failed; the error has been logged.
    Failed,
}

pub struct NotificationPlayer {
    audio: Arc<dyn AudioSink>,
    speech: Arc<dyn SpeechEngine>,
    /// Held for the whole playback so two notifications never share the device.
    device: Mutex<()>,
}

impl NotificationPlayer {
    pub fn new(audio: Arc<dyn AudioSink>, speech: Arc<dyn SpeechEngine>) -> Self {
        Self {
            audio,
            speech,
            device: Mutex::new(()),
        }
    }

    /// Plays the notification for `condition` moving in `direction`, reading
    /// settings from `config`. Blocks until playback completes.
    pub fn notify(&self, condition: ConditionId, direction: Direction, config: &Config) -> Outcome {
        self.play(&NotificationRequest::resolve(condition, direction, config))
    }

    /// Test playback from the settings surface. Speaks a fixed phrase when the
    /// configured text is empty so the user always hears something.
    pub fn preview(&self, condition: ConditionId, direction: Direction, config: &Config) -> Outcome {
        let mut request = NotificationRequest::resolve(condition, direction, config);
        if request.text.is_empty() {
            request.text = PREVIEW_FALLBACK_TEXT.to_string();
        }
        self.play(&request)
    }

    pub fn voices(&self) -> Result<Vec<VoiceInfo>, PlaybackError> {
        self.speech.voices()
    }

    pub fn play(&self, request: &NotificationRequest) -> Outcome {
        let _device = self.device.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(path) = request.audio_path.as_deref() {
            if is_readable_file(path) {
                match self.audio.play_file(path, request.gain()) {
                    Ok(()) => {
                        debug!(
                            condition = %request.condition,
                            enabled = request.is_enabled,
                            path = %path.display(),
                            "Played clip"
                        );
                        return Outcome::Clip;
                    }
                    Err(e) => warn!(
                        condition = %request.condition,
                        "Clip {} failed, falling back to speech: {e}",
                        path.display()
                    ),
                }
            } else {
                warn!(
                    condition = %request.condition,
                    "Clip {} is missing or unreadable, falling back to speech",
                    path.display()
                );
            }
        }

        if request.text.is_empty() {
            debug!(condition = %request.condition, "No text configured; notification skipped");
            return Outcome::Silent;
        }
        self.speak(request)
    }

    fn speak(&self, request: &NotificationRequest) -> Outcome {
        debug!(condition = %request.condition, enabled = request.is_enabled, "Speaking notification");
        let mut speech = SpeechRequest {
            text: &request.text,
            volume: request.speech_volume,
            rate: request.speech_rate,
            voice: request.voice.as_deref(),
        };

        let mut result = self.speech.speak(&speech);
        if let Err(PlaybackError::VoiceUnavailable(voice)) = &result {
            debug!("Voice '{voice}' unavailable, using the default voice");
            speech.voice = None;
            result = self.speech.speak(&speech);
        }

        match result {
            Ok(()) => Outcome::Speech,
            Err(e) => {
                warn!(condition = %request.condition, "Speech failed: {e}");
                Outcome::Failed
            }
        }
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}
