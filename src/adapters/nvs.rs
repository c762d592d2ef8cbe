//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`].
//!
//! | Namespace  | Keys            | Contents                           |
//! |------------|-----------------|------------------------------------|
//! | `smartiron`| `syscfg`        | postcard [`SystemConfig`]          |
//! | `net`      | `netcfg`        | postcard [`NetworkConfig`]         |
//! | `blackbox` | `head`, `e00`.. | event log ring (see `blackbox`)    |
//!
//! - Config validation: [`SystemConfig::validate`] runs before every save
//!   and after every load.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - NVS limits namespace and key names to 15 bytes; longer names are cut.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::{NetworkConfig, SystemConfig};

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "smartiron";
const CONFIG_KEY: &str = "syscfg";
const NET_NAMESPACE: &str = "net";
const NET_KEY: &str = "netcfg";

/// Largest blob either config can serialise to.
const MAX_CONFIG_BLOB: usize = 256;

/// NVS name limit, plus the terminating nul.
const NAME_BUF: usize = 16;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the NVS partition is
    /// erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called from the single main-task context before any
            // concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES as i32 || ret == ESP_ERR_NVS_NEW_VERSION_FOUND as i32 {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK as i32
                    || unsafe { nvs_flash_init() } != ESP_OK as i32
                {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK as i32 {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: RefCell::new(HashMap::new()),
        })
    }

    // ── Network credentials ───────────────────────────────────

    /// Stored network config, or the build-time defaults.
    pub fn load_network(&self) -> NetworkConfig {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        match self.read(NET_NAMESPACE, NET_KEY, &mut buf) {
            Ok(len) => postcard::from_bytes(&buf[..len]).unwrap_or_else(|_| {
                warn!("NvsAdapter: stored network config corrupted, using defaults");
                NetworkConfig::default()
            }),
            Err(_) => NetworkConfig::default(),
        }
    }

    pub fn save_network(&mut self, config: &NetworkConfig) -> Result<(), StorageError> {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        let bytes = postcard::to_slice(config, &mut buf).map_err(|_| StorageError::Full)?;
        self.write(NET_NAMESPACE, NET_KEY, bytes)
    }

    // ── Internal ──────────────────────────────────────────────

    /// Copy a name into a nul-terminated buffer, cutting it to 15 bytes.
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    fn c_name(name: &str) -> [u8; NAME_BUF] {
        let mut buf = [0u8; NAME_BUF];
        let len = name.len().min(NAME_BUF - 1);
        buf[..len].copy_from_slice(&name.as_bytes()[..len]);
        buf
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
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

        // SAFETY: `ns` is nul-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: `handle` was opened above and is not used afterwards.
        unsafe { nvs_close(handle) };
        result
    }

    #[cfg(target_os = "espidf")]
    fn commit(handle: nvs_handle_t, ret: i32) -> Result<(), i32> {
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        // SAFETY: valid open handle from with_nvs_handle.
        let ret = unsafe { nvs_commit(handle) };
        if ret != ESP_OK as i32 {
            return Err(ret);
        }
        Ok(())
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        let len = match self.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let cfg: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut buf = [0u8; MAX_CONFIG_BLOB];
        let bytes = postcard::to_slice(config, &mut buf).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY), bytes.to_vec());
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(CONFIG_KEY);
            Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
                // SAFETY: key is nul-terminated; bytes outlives the call.
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
                };
                Self::commit(handle, ret)
            })
            .map_err(|e| {
                warn!("NvsAdapter: NVS write error {}", e);
                ConfigError::IoError
            })?;
        }

        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let store = self.store.borrow();
            let data = store
                .get(&Self::composite_key(namespace, key))
                .ok_or(StorageError::NotFound)?;
            let dst = buf.get_mut(..data.len()).ok_or(StorageError::BufferTooSmall)?;
            dst.copy_from_slice(data);
            Ok(data.len())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let mut size = buf.len();
                // SAFETY: buf is valid for `size` bytes.
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
                };
                if ret != ESP_OK as i32 {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND as i32 => Err(StorageError::NotFound),
                Err(e) if e == ESP_ERR_NVS_INVALID_LENGTH as i32 => Err(StorageError::BufferTooSmall),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(namespace, key), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_nvs_handle(namespace, true, |handle| {
                // SAFETY: key is nul-terminated; data outlives the call.
                let ret = unsafe {
                    nvs_set_blob(handle, key.as_ptr() as *const _, data.as_ptr() as *const _, data.len())
                };
                Self::commit(handle, ret)
            })
            .map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE as i32 {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .remove(&Self::composite_key(namespace, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_nvs_handle(namespace, true, |handle| {
                // SAFETY: key is nul-terminated.
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
                if ret == ESP_ERR_NVS_NOT_FOUND as i32 {
                    return Ok(());
                }
                Self::commit(handle, ret)
            })
            .or_else(|e| {
                // Namespace never created: nothing to delete.
                if e == ESP_ERR_NVS_NOT_FOUND as i32 {
                    Ok(())
                } else {
                    Err(StorageError::IoError)
                }
            })
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow()
                .contains_key(&Self::composite_key(namespace, key))
        }

        #[cfg(target_os = "espidf")]
        {
            let key = Self::c_name(key);
            Self::with_nvs_handle(namespace, false, |handle| {
                // SAFETY: key is nul-terminated.
                let ret =
                    unsafe { nvs_find_key(handle, key.as_ptr() as *const _, core::ptr::null_mut()) };
                Ok(ret == ESP_OK as i32)
            })
            .unwrap_or(false)
        }
    }
}
