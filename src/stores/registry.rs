//! Platform registry adapter.
//!
//! On Windows the shared machine identifier is written as a `REG_SZ` value under
//! `HKEY_CURRENT_USER`. Other platforms have no registry; writes there fail with
//! [`StoreError::PlatformUnsupported`], which callers treat as a no-op.

use crate::stores::StoreError;

/// Default key, relative to `HKEY_CURRENT_USER`.
pub const DEFAULT_KEY: &str = r"Software\Cursor\Telemetry";

/// Default value name under [`DEFAULT_KEY`].
pub const DEFAULT_VALUE_NAME: &str = "MachineId";

/// Writes the machine identifier to the platform registry.
pub trait RegistryWriter {
    /// Store `value` under the configured key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::PlatformUnsupported` where no registry exists,
    /// `StoreError::Permission` if access is denied, or `StoreError::Io` for
    /// any other failure.
    fn write_machine_id(&self, value: &str) -> Result<(), StoreError>;

    /// Human-readable location, for the operation log.
    fn location(&self) -> String;
}

/// The real per-user registry.
#[derive(Debug, Clone)]
pub struct SystemRegistry {
    key: String,
    value_name: String,
}

impl SystemRegistry {
    #[must_use]
    pub fn new(key: impl Into<String>, value_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_name: value_name.into(),
        }
    }
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_KEY, DEFAULT_VALUE_NAME)
    }
}

impl RegistryWriter for SystemRegistry {
    fn write_machine_id(&self, value: &str) -> Result<(), StoreError> {
        write_value_impl(&self.key, &self.value_name, value)
    }

    fn location(&self) -> String {
        format!(r"HKCU\{}\{}", self.key, self.value_name)
    }
}

/// Registry writer that does nothing, used when the registry step is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRegistry;

impl RegistryWriter for DisabledRegistry {
    fn write_machine_id(&self, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::PlatformUnsupported(
            "registry update disabled by configuration".to_string(),
        ))
    }

    fn location(&self) -> String {
        "registry (disabled)".to_string()
    }
}

#[cfg(windows)]
fn write_value_impl(key: &str, value_name: &str, value: &str) -> Result<(), StoreError> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows::Win32::Foundation::{ERROR_ACCESS_DENIED, ERROR_SUCCESS};
    use windows::Win32::System::Registry::{
        HKEY, HKEY_CURRENT_USER, KEY_SET_VALUE, REG_OPTION_NON_VOLATILE, REG_SZ, RegCloseKey,
        RegCreateKeyExW, RegSetValueExW,
    };
    use windows::core::PCWSTR;

    fn to_wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    struct RegKeyGuard(HKEY);
    impl Drop for RegKeyGuard {
        fn drop(&mut self) {
            unsafe {
                let _ = RegCloseKey(self.0);
            }
        }
    }

    let key_path = to_wide(key);
    let name = to_wide(value_name);
    let data = to_wide(value);

    unsafe {
        let mut hkey = HKEY::default();
        let status = RegCreateKeyExW(
            HKEY_CURRENT_USER,
            PCWSTR(key_path.as_ptr()),
            Some(0),
            None,
            REG_OPTION_NON_VOLATILE,
            KEY_SET_VALUE,
            None,
            &mut hkey,
            None,
        );
        if status == ERROR_ACCESS_DENIED {
            return Err(StoreError::Permission(format!(r"HKCU\{key}")));
        }
        if status != ERROR_SUCCESS {
            return Err(StoreError::Io(format!(
                r"RegCreateKeyExW HKCU\{key} failed: status={}",
                status.0
            )));
        }
        let _guard = RegKeyGuard(hkey);

        let bytes = &data.align_to::<u8>().1[..data.len() * 2];
        let status = RegSetValueExW(hkey, PCWSTR(name.as_ptr()), Some(0), REG_SZ, Some(bytes));
        if status == ERROR_ACCESS_DENIED {
            return Err(StoreError::Permission(format!(r"HKCU\{key}\{value_name}")));
        }
        if status != ERROR_SUCCESS {
            return Err(StoreError::Io(format!(
                r"RegSetValueExW HKCU\{key}\{value_name} failed: status={}",
                status.0
            )));
        }
    }

    Ok(())
}

#[cfg(not(windows))]
fn write_value_impl(_key: &str, _value_name: &str, _value: &str) -> Result<(), StoreError> {
    Err(StoreError::PlatformUnsupported(format!(
        "no registry on {}",
        std::env::consts::OS
    )))
}
