//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`], [`StoragePort`] and [`CredentialPort`].
//!
//! | Namespace | Key      | Format                  |
//! |-----------|----------|-------------------------|
//! | `cattoy`  | `toycfg` | postcard [`ToyConfig`]  |
//! | `storage` | `ssid`   | NVS string              |
//! | `storage` | `pass`   | NVS string              |
//!
//! Wi-Fi credentials live where the provisioning sketch put them, as
//! plain NVS strings, so a toy flashed over an existing install keeps
//! its network.

use crate::adapters::utils::is_printable_ascii;
use crate::app::ports::{
    ConfigError, ConfigPort, CredentialPort, StorageError, StoragePort, WifiCredentials,
};
use crate::config::ToyConfig;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "cattoy";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "toycfg";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 1024;

const CRED_NAMESPACE: &str = "storage";
const SSID_KEY: &str = "ssid";
const PASS_KEY: &str = "pass";

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name (max 15 chars).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn read_string<const N: usize>(
        namespace: &str,
        key: &str,
    ) -> Result<Option<heapless::String<N>>, StorageError> {
        let key = Self::c_name(key);
        let result = Self::with_nvs_handle(namespace, false, |handle| {
            // N chars + NUL
            let mut buf = [0u8; 128];
            let mut len = (N + 1).min(buf.len());
            let ret = unsafe {
                nvs_get_str(
                    handle,
                    key.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut len,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok((buf, len))
        });

        match result {
            Ok((buf, len)) => {
                let raw = &buf[..len.saturating_sub(1)];
                let text = core::str::from_utf8(raw).map_err(|_| StorageError::InvalidData)?;
                let mut out = heapless::String::new();
                out.push_str(text).map_err(|_| StorageError::TooLarge)?;
                Ok(Some(out))
            }
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::TooLarge),
            Err(_) => Err(StorageError::IoError),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_string<const N: usize>(
        &self,
        namespace: &str,
        key: &str,
    ) -> Result<Option<heapless::String<N>>, StorageError> {
        let composite = Self::composite_key(namespace, key);
        let store = self.store.borrow();
        let Some(raw) = store.get(&composite) else {
            return Ok(None);
        };
        let text = core::str::from_utf8(raw).map_err(|_| StorageError::InvalidData)?;
        let mut out = heapless::String::new();
        out.push_str(text).map_err(|_| StorageError::TooLarge)?;
        Ok(Some(out))
    }

    /// Write Wi-Fi credentials as NVS strings.
    pub fn store_wifi_credentials(&mut self, creds: &WifiCredentials) -> Result<(), StorageError> {
        if creds.ssid.is_empty() || !is_printable_ascii(&creds.ssid) {
            return Err(StorageError::InvalidData);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.write(CRED_NAMESPACE, SSID_KEY, creds.ssid.as_bytes())?;
            self.write(CRED_NAMESPACE, PASS_KEY, creds.password.as_bytes())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut ssid = [0u8; 33];
            ssid[..creds.ssid.len()].copy_from_slice(creds.ssid.as_bytes());
            let mut pass = [0u8; 65];
            pass[..creds.password.len()].copy_from_slice(creds.password.as_bytes());
            let ssid_key = Self::c_name(SSID_KEY);
            let pass_key = Self::c_name(PASS_KEY);

            Self::with_nvs_handle(CRED_NAMESPACE, true, |handle| {
                for (key, value) in [(&ssid_key, &ssid[..]), (&pass_key, &pass[..])] {
                    let ret = unsafe {
                        nvs_set_str(handle, key.as_ptr() as *const _, value.as_ptr() as *const _)
                    };
                    if ret != ESP_OK {
                        return Err(ret);
                    }
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(|_| StorageError::IoError)
        }
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<ToyConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        let stored: Option<Vec<u8>> = {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow().get(&key).cloned()
        };

        #[cfg(target_os = "espidf")]
        let stored: Option<Vec<u8>> = {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
                let key_cstr = b"toycfg\0";
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            });

            match result {
                Ok(bytes) => Some(bytes),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => None,
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    None
                }
            }
        };

        let Some(bytes) = stored else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(ToyConfig::default());
        };

        let cfg: ToyConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        if let Err(e) = cfg.validate() {
            warn!("NvsAdapter: stored config out of range ({}), ignoring", e);
            return Err(e);
        }
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &ToyConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                let key_cstr = b"toycfg\0";
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key_cstr.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

impl CredentialPort for NvsAdapter {
    fn wifi_credentials(&self) -> Result<Option<WifiCredentials>, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        let (ssid, password) = (
            self.read_string::<32>(CRED_NAMESPACE, SSID_KEY)?,
            self.read_string::<64>(CRED_NAMESPACE, PASS_KEY)?,
        );

        #[cfg(target_os = "espidf")]
        let (ssid, password) = (
            Self::read_string::<32>(CRED_NAMESPACE, SSID_KEY)?,
            Self::read_string::<64>(CRED_NAMESPACE, PASS_KEY)?,
        );

        match (ssid, password) {
            (Some(ssid), Some(password)) if !ssid.is_empty() => {
                if !is_printable_ascii(&ssid) {
                    warn!("NvsAdapter: stored SSID is not printable ASCII");
                    return Err(StorageError::InvalidData);
                }
                Ok(Some(WifiCredentials { ssid, password }))
            }
            _ => Ok(None),
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) if data.len() > buf.len() => Err(StorageError::TooLarge),
                Some(data) => {
                    buf[..data.len()].copy_from_slice(data);
                    Ok(data.len())
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH => Err(StorageError::TooLarge),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(|_| StorageError::IoError)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_nvs_handle(namespace, true, |handle| {
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_nvs_handle(namespace, false, |handle| {
                let ret = unsafe {
                    nvs_find_key(handle, key.as_ptr() as *const _, core::ptr::null_mut())
                };
                Ok(ret == ESP_OK)
            })
            .unwrap_or(false)
        }
    }
}
