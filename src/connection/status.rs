// Status du périphérique de sortie
//
// Le stream démarre suspendu et passe en Running au premier resume().
// Une erreur du stream le fait passer en Error jusqu'au prochain redémarrage.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Stream built, not started yet
    Suspended = 0,
    Running = 1,
    Error = 2,
}

impl DeviceStatus {
    pub fn label(self) -> &'static str {
        match self {
            DeviceStatus::Suspended => "suspended",
            DeviceStatus::Running => "running",
            DeviceStatus::Error => "error",
        }
    }
}

impl From<u8> for DeviceStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => DeviceStatus::Running,
            2 => DeviceStatus::Error,
            _ => DeviceStatus::Suspended,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Atomic wrapper pour partager le status entre le callback d'erreur et l'UI
#[derive(Clone)]
pub struct AtomicDeviceStatus {
    inner: Arc<AtomicU8>,
}

impl AtomicDeviceStatus {
    pub fn new(status: DeviceStatus) -> Self {
        Self {
            inner: Arc::new(AtomicU8::new(status as u8)),
        }
    }

    pub fn get(&self) -> DeviceStatus {
        DeviceStatus::from(self.inner.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: DeviceStatus) {
        self.inner.store(status as u8, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.get() == DeviceStatus::Running
    }
}

impl Default for AtomicDeviceStatus {
    fn default() -> Self {
        Self::new(DeviceStatus::Suspended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_suspended() {
        let status = AtomicDeviceStatus::default();
        assert_eq!(status.get(), DeviceStatus::Suspended);
        assert!(!status.is_running());
    }

    #[test]
    fn test_clones_share_status() {
        let status = AtomicDeviceStatus::default();
        let error_callback = status.clone();

        status.set(DeviceStatus::Running);
        assert!(error_callback.is_running());

        error_callback.set(DeviceStatus::Error);
        assert_eq!(status.get(), DeviceStatus::Error);
        assert_eq!(status.get().to_string(), "error");
    }

    #[test]
    fn test_unknown_values_read_as_suspended() {
        assert_eq!(DeviceStatus::from(42), DeviceStatus::Suspended);
        for status in [DeviceStatus::Suspended, DeviceStatus::Running, DeviceStatus::Error] {
            assert_eq!(DeviceStatus::from(status as u8), status);
        }
    }
}
