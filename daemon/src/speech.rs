/// Text-to-speech through the Windows Speech API (SAPI 5).
///
/// Each call creates its own `ISpVoice` on the calling thread and speaks
/// synchronously, so the caller is blocked until the utterance has finished.
///
/// On non-Windows platforms the public API compiles but every call returns
/// [`PlaybackError::Unsupported`].
use crate::player::{PlaybackError, SpeechEngine, SpeechRequest, VoiceInfo};

/// Parses a SAPI `Language` attribute (hex LCIDs separated by `;`, e.g.
/// `804` or `409;9`) into the first LCID.
pub fn parse_lcid(attribute: &str) -> Option<u32> {
    let first = attribute.split(';').next()?.trim();
    u32::from_str_radix(first, 16).ok()
}

/// Picks the installed voice matching `wanted`: exact match first, then
/// case-insensitive.
pub fn find_voice<'a, I>(installed: I, wanted: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = installed.into_iter().collect();
    names
        .iter()
        .position(|n| *n == wanted)
        .or_else(|| names.iter().position(|n| n.eq_ignore_ascii_case(wanted)))
}

#[derive(Debug, Default)]
pub struct SapiSpeech;

impl SpeechEngine for SapiSpeech {
    fn speak(&self, request: &SpeechRequest<'_>) -> Result<(), PlaybackError> {
        #[cfg(windows)]
        {
            imp::speak(request)
        }
        #[cfg(not(windows))]
        {
            let _ = request;
            Err(PlaybackError::Unsupported("speech synthesis"))
        }
    }

    fn voices(&self) -> Result<Vec<VoiceInfo>, PlaybackError> {
        #[cfg(windows)]
        {
            Ok(imp::installed_voices()?.into_iter().map(|(voice, _)| voice).collect())
        }
        #[cfg(not(windows))]
        {
            Err(PlaybackError::Unsupported("speech synthesis"))
        }
    }
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use windows::core::{PCWSTR, PWSTR};
    use windows::Win32::Foundation::FALSE;
    use windows::Win32::Globalization::LCIDToLocaleName;
    use windows::Win32::Media::Speech::{
        ISpObjectToken, ISpObjectTokenCategory, ISpVoice, SpObjectTokenCategory, SpVoice,
        SPF_DEFAULT,
    };
    use windows::Win32::System::Com::{
        CoCreateInstance, CoInitializeEx, CoTaskMemFree, CLSCTX_ALL, COINIT_MULTITHREADED,
    };

    use super::{find_voice, parse_lcid};
    use crate::player::{PlaybackError, SpeechRequest, VoiceInfo};

    const VOICES_CATEGORY: &str = r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Speech\Voices";

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn speech_err(e: windows::core::Error) -> PlaybackError {
        PlaybackError::Speech(e.to_string())
    }

    /// Reads a string value and frees the COM allocation.
    unsafe fn take_string(p: PWSTR) -> Option<String> {
        if p.is_null() {
            return None;
        }
        let s = p.to_string().ok();
        CoTaskMemFree(Some(p.0 as *const _));
        s
    }

    const LOCALE_NAME_MAX_LENGTH: usize = 85;

    fn locale_name(lcid: u32) -> Option<String> {
        let mut buf = [0u16; LOCALE_NAME_MAX_LENGTH];
        let len = unsafe { LCIDToLocaleName(lcid, Some(&mut buf), 0) };
        if len <= 1 {
            return None;
        }
        // `len` counts the terminating NUL.
        String::from_utf16(&buf[..len as usize - 1]).ok()
    }

    /// All registered voices with their tokens.
    pub fn installed_voices() -> Result<Vec<(VoiceInfo, ISpObjectToken)>, PlaybackError> {
        let category_w = to_wide(VOICES_CATEGORY);
        let attributes_w = to_wide("Attributes");
        let name_w = to_wide("Name");
        let language_w = to_wide("Language");

        unsafe {
            let _ = CoInitializeEx(None, COINIT_MULTITHREADED);

            let category: ISpObjectTokenCategory =
                CoCreateInstance(&SpObjectTokenCategory, None, CLSCTX_ALL).map_err(speech_err)?;
            category
                .SetId(PCWSTR::from_raw(category_w.as_ptr()), FALSE)
                .map_err(speech_err)?;
            let tokens = category
                .EnumTokens(PCWSTR::null(), PCWSTR::null())
                .map_err(speech_err)?;

            let mut count = 0u32;
            tokens.GetCount(&mut count).map_err(speech_err)?;

            let mut voices = Vec::with_capacity(count as usize);
            for i in 0..count {
                let Ok(token) = tokens.Item(i) else { continue };
                let Ok(attrs) = token.OpenKey(PCWSTR::from_raw(attributes_w.as_ptr())) else {
                    continue;
                };
                let name = attrs
                    .GetStringValue(PCWSTR::from_raw(name_w.as_ptr()))
                    .ok()
                    .and_then(|p| take_string(p));
                let culture = attrs
                    .GetStringValue(PCWSTR::from_raw(language_w.as_ptr()))
                    .ok()
                    .and_then(|p| take_string(p))
                    .as_deref()
                    .and_then(parse_lcid)
                    .and_then(locale_name);
                if let Some(name) = name {
                    voices.push((VoiceInfo { name, culture }, token));
                }
            }
            Ok(voices)
        }
    }

    pub fn speak(request: &SpeechRequest<'_>) -> Result<(), PlaybackError> {
        let text_w = to_wide(request.text);

        unsafe {
            let _ = CoInitializeEx(None, COINIT_MULTITHREADED);

            let voice: ISpVoice = CoCreateInstance(&SpVoice, None, CLSCTX_ALL).map_err(speech_err)?;

            if let Some(wanted) = request.voice {
                let installed = installed_voices()?;
                let index = find_voice(installed.iter().map(|(v, _)| v.name.as_str()), wanted)
                    .ok_or_else(|| PlaybackError::VoiceUnavailable(wanted.to_string()))?;
                voice.SetVoice(&installed[index].1).map_err(speech_err)?;
            }

            voice.SetVolume(u16::from(request.volume)).map_err(speech_err)?;
            voice.SetRate(request.rate).map_err(speech_err)?;
            voice
                .Speak(PCWSTR::from_raw(text_w.as_ptr()), SPF_DEFAULT.0 as u32, None)
                .map_err(speech_err)?;
        }
        Ok(())
    }
}
