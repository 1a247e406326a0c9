/// TUN sensor: a tunneling adapter is considered active when any adapter that
/// is up has a name or description containing one of the configured keywords
/// (case-insensitive substring match).
use crate::condition::{ConditionSource, SampleError, TriState};
use crate::config::Config;

const SENSOR: &str = "network adapters";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub name: String,
    pub description: String,
    pub is_up: bool,
}

/// `keywords` must already be lowercase (see [`crate::config::TunConfig::keywords`]).
pub fn matches_keywords(adapters: &[AdapterInfo], keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    adapters.iter().filter(|a| a.is_up).any(|a| {
        let name = a.name.to_lowercase();
        let description = a.description.to_lowercase();
        keywords
            .iter()
            .any(|k| name.contains(k.as_str()) || description.contains(k.as_str()))
    })
}

#[derive(Debug, Default)]
pub struct TunAdapterSource;

impl ConditionSource for TunAdapterSource {
    fn sample(&mut self, config: &Config) -> Result<TriState, SampleError> {
        let adapters = imp::list_adapters().map_err(|e| SampleError::Unavailable(SENSOR, e))?;
        Ok(TriState::from(matches_keywords(&adapters, &config.tun.keywords())))
    }
}

// ── Windows implementation ────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use windows::Win32::Foundation::{ERROR_BUFFER_OVERFLOW, ERROR_SUCCESS};
    use windows::Win32::NetworkManagement::IpHelper::{
        GetAdaptersAddresses, GAA_FLAG_SKIP_ANYCAST, GAA_FLAG_SKIP_DNS_SERVER,
        GAA_FLAG_SKIP_MULTICAST, IP_ADAPTER_ADDRESSES_LH,
    };
    use windows::Win32::NetworkManagement::Ndis::IfOperStatusUp;
    use windows::Win32::Networking::WinSock::AF_UNSPEC;

    use super::AdapterInfo;

    const INITIAL_BUFFER_BYTES: u32 = 16 * 1024;
    const MAX_ATTEMPTS: usize = 3;

    pub fn list_adapters() -> Result<Vec<AdapterInfo>, String> {
        let flags = GAA_FLAG_SKIP_ANYCAST | GAA_FLAG_SKIP_MULTICAST | GAA_FLAG_SKIP_DNS_SERVER;
        let mut size = INITIAL_BUFFER_BYTES;

        for _ in 0..MAX_ATTEMPTS {
            // u64 backing keeps the adapter records 8-byte aligned.
            let mut buf: Vec<u64> = vec![0; (size as usize).div_ceil(8)];
            let first = buf.as_mut_ptr() as *mut IP_ADAPTER_ADDRESSES_LH;

            let ret = unsafe {
                GetAdaptersAddresses(AF_UNSPEC.0 as u32, flags, None, Some(first), &mut size)
            };
            if ret == ERROR_BUFFER_OVERFLOW.0 {
                continue;
            }
            if ret != ERROR_SUCCESS.0 {
                return Err(format!("GetAdaptersAddresses failed with code {ret}"));
            }

            let mut adapters = Vec::new();
            let mut cursor = first as *const IP_ADAPTER_ADDRESSES_LH;
            while !cursor.is_null() {
                let adapter = unsafe { &*cursor };
                adapters.push(AdapterInfo {
                    name: unsafe { adapter.FriendlyName.to_string() }.unwrap_or_default(),
                    description: unsafe { adapter.Description.to_string() }.unwrap_or_default(),
                    is_up: adapter.OperStatus == IfOperStatusUp,
                });
                cursor = adapter.Next;
            }
            return Ok(adapters);
        }
        Err("GetAdaptersAddresses kept reporting a larger buffer".to_string())
    }
}

// ── Portable fallback ─────────────────────────────────────────────────────────

#[cfg(not(windows))]
mod imp {
    use sysinfo::Networks;

    use super::AdapterInfo;

    /// Interface names only; sysinfo reports neither descriptions nor link
    /// state, so every listed interface is treated as up.
    pub fn list_adapters() -> Result<Vec<AdapterInfo>, String> {
        let networks = Networks::new_with_refreshed_list();
        Ok(networks
            .list()
            .keys()
            .map(|name| AdapterInfo {
                name: name.clone(),
                description: String::new(),
                is_up: true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(name: &str, description: &str, is_up: bool) -> AdapterInfo {
        AdapterInfo {
            name: name.to_string(),
            description: description.to_string(),
            is_up,
        }
    }

    fn keywords(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matches_name_case_insensitively() {
        let adapters = vec![adapter("Ethernet", "Intel(R) Ethernet", true), adapter("Meta", "", true)];
        assert!(matches_keywords(&adapters, &keywords(&["meta"])));
    }

    #[test]
    fn matches_description_substring() {
        let adapters = vec![adapter("Local Area Connection 2", "WireGuard Tunnel", true)];
        assert!(matches_keywords(&adapters, &keywords(&["wireguard"])));
    }

    #[test]
    fn ignores_adapters_that_are_down() {
        let adapters = vec![adapter("wintun", "Wintun Userspace Tunnel", false)];
        assert!(!matches_keywords(&adapters, &keywords(&["wintun"])));
    }

    #[test]
    fn no_keywords_never_matches() {
        let adapters = vec![adapter("tun0", "", true)];
        assert!(!matches_keywords(&adapters, &[]));
    }

    #[test]
    fn no_match_is_inactive() {
        let adapters = vec![adapter("Wi-Fi", "Intel(R) Wi-Fi 6 AX201", true)];
        assert!(!matches_keywords(&adapters, &keywords(&["clash", "sing-box"])));
    }

    #[test]
    fn source_returns_known_state() {
        // The host's adapters are unknown here; only the shape of the answer is checked.
        let mut source = TunAdapterSource;
        if let Ok(state) = source.sample(&Config::default()) {
            assert!(state.is_known());
        }
    }
}
