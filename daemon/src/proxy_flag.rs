/// System proxy sensor: the per-user `ProxyEnable` flag under
/// `HKCU\Software\Microsoft\Windows\CurrentVersion\Internet Settings`.
///
/// Any nonzero value counts as enabled. A missing key or value is a sampling
/// error, so the previous state is kept.
///
/// On non-Windows platforms the source compiles but every sample fails with
/// [`SampleError::Unsupported`].
use crate::condition::{ConditionSource, SampleError, TriState};
use crate::config::Config;

const SENSOR: &str = "proxy flag";

#[derive(Debug, Default)]
pub struct ProxyFlagSource;

impl ConditionSource for ProxyFlagSource {
    fn sample(&mut self, _config: &Config) -> Result<TriState, SampleError> {
        #[cfg(windows)]
        {
            let value = imp::read_proxy_enable().map_err(|e| SampleError::Unavailable(SENSOR, e))?;
            Ok(TriState::from(value != 0))
        }
        #[cfg(not(windows))]
        {
            Err(SampleError::Unsupported(SENSOR))
        }
    }
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::ERROR_SUCCESS;
    use windows::Win32::System::Registry::{RegGetValueW, HKEY_CURRENT_USER, RRF_RT_REG_DWORD};

    const INTERNET_SETTINGS_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Internet Settings";
    const VALUE_NAME: &str = "ProxyEnable";

    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    pub fn read_proxy_enable() -> Result<u32, String> {
        let key_w = to_wide(INTERNET_SETTINGS_KEY);
        let val_w = to_wide(VALUE_NAME);
        let mut data: u32 = 0;
        let mut size = std::mem::size_of::<u32>() as u32;

        let err = unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_w.as_ptr()),
                PCWSTR::from_raw(val_w.as_ptr()),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut data as *mut u32 as *mut _),
                Some(&mut size),
            )
        };
        if err != ERROR_SUCCESS {
            return Err(format!("RegGetValueW({VALUE_NAME}) failed: {err:?}"));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn sampling_is_unsupported_off_windows() {
        let mut source = ProxyFlagSource;
        let err = source.sample(&Config::default()).unwrap_err();
        assert!(matches!(err, SampleError::Unsupported(_)));
        assert!(err.to_string().contains("Windows"));
    }

    #[cfg(windows)]
    #[test]
    fn sampling_returns_a_known_state_or_error() {
        let mut source = ProxyFlagSource;
        if let Ok(state) = source.sample(&Config::default()) {
            assert!(state.is_known());
        }
    }
}
