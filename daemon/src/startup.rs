/// Windows startup registration via the `HKCU\...\Run` registry key.
///
/// When `run_on_startup` is set the daemon registers itself, with `--silent`,
/// so that Windows launches it when the user logs in. The registration is
/// re-applied on every start and every config reload, and can be removed with
/// the `--unregister-startup` flag.
///
/// On non-Windows platforms every function compiles and succeeds as a no-op.
use anyhow::Result;
use tracing::info;

/// Flag passed by the Run entry so the daemon starts without its banner.
pub const SILENT_FLAG: &str = "--silent";

/// Builds the Run value data: the quoted executable path plus [`SILENT_FLAG`].
pub fn command_line(exe_path: &str) -> String {
    format!("\"{exe_path}\" {SILENT_FLAG}")
}

// ── Windows implementation ─────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use anyhow::{bail, Result};
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, ERROR_SUCCESS};
    use windows::Win32::System::Registry::{
        RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegSetValueExW, HKEY,
        HKEY_CURRENT_USER, KEY_SET_VALUE, REG_OPTION_NON_VOLATILE, REG_SZ,
    };

    const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";
    const VALUE_NAME: &str = "ProxyMonitor";

    /// Converts a Rust `&str` to a null-terminated UTF-16 `Vec<u16>`.
    fn to_wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Writes `command` under `HKCU\...\Run\ProxyMonitor`.
    /// Idempotent: overwrites an existing value.
    pub fn register(command: &str) -> Result<()> {
        let key_w = to_wide(RUN_KEY);
        let val_w = to_wide(VALUE_NAME);
        let data_w = to_wide(command);
        let data_bytes: &[u8] = unsafe {
            std::slice::from_raw_parts(data_w.as_ptr() as *const u8, data_w.len() * 2)
        };

        let mut hkey = HKEY::default();
        let err = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_w.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_SET_VALUE,
                None,
                &mut hkey,
                None,
            )
        };
        if err != ERROR_SUCCESS {
            bail!("RegCreateKeyExW failed: {:?}", err);
        }

        let err = unsafe {
            RegSetValueExW(hkey, PCWSTR::from_raw(val_w.as_ptr()), 0, REG_SZ, Some(data_bytes))
        };
        unsafe {
            let _ = RegCloseKey(hkey);
        };

        if err != ERROR_SUCCESS {
            bail!("RegSetValueExW failed: {:?}", err);
        }
        Ok(())
    }

    /// Removes the `ProxyMonitor` value from `HKCU\...\Run`.
    /// Succeeds silently if the value or key does not exist.
    pub fn unregister() -> Result<()> {
        let key_w = to_wide(RUN_KEY);
        let val_w = to_wide(VALUE_NAME);

        let mut hkey = HKEY::default();
        let err = unsafe {
            RegOpenKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR::from_raw(key_w.as_ptr()),
                0,
                KEY_SET_VALUE,
                &mut hkey,
            )
        };
        if err != ERROR_SUCCESS {
            // Key doesn't exist, nothing to remove.
            return Ok(());
        }

        let err = unsafe { RegDeleteValueW(hkey, PCWSTR::from_raw(val_w.as_ptr())) };
        unsafe {
            let _ = RegCloseKey(hkey);
        };

        if err != ERROR_SUCCESS && err != ERROR_FILE_NOT_FOUND {
            bail!("RegDeleteValueW failed: {:?}", err);
        }
        Ok(())
    }
}

// ── Public API ─────────────────────────────────────────────────────────────────

/// Registers the running binary to launch silently at user login.
/// Idempotent, safe to call on every startup.
pub fn register_startup() -> Result<()> {
    #[cfg(windows)]
    {
        let exe = std::env::current_exe()
            .map_err(|e| anyhow::anyhow!("Failed to locate daemon executable: {e}"))?;
        let command = command_line(&exe.to_string_lossy());
        imp::register(&command)?;
        info!("Registered in Windows startup: {command}");
    }
    Ok(())
}

/// Removes the daemon from the Windows startup registry.
pub fn unregister_startup() -> Result<()> {
    #[cfg(windows)]
    {
        imp::unregister()?;
        info!("Removed from Windows startup registry");
    }
    Ok(())
}

/// Applies the `run_on_startup` setting.
pub fn sync_startup(enabled: bool) -> Result<()> {
    #[cfg(not(windows))]
    info!(enabled, "Startup registration is Windows-only; ignoring");
    if enabled {
        register_startup()
    } else {
        unregister_startup()
    }
}
