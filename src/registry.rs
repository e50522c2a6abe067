use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MedleyError, Result};
use crate::types::{Capability, QualityTier};

pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_else(|_| std::time::Duration::from_secs(0))
            .as_secs()
    }
}

/// Static provider metadata, loaded once at startup. Only the
/// availability flag changes at runtime, and only through the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub capability: Capability,
    pub unit_cost_usd_micros: u64,
    pub quality: QualityTier,
    pub avg_latency_ms: u64,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl ProviderDescriptor {
    pub fn new(
        name: impl Into<String>,
        capability: Capability,
        unit_cost_usd_micros: u64,
        quality: QualityTier,
        avg_latency_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            capability,
            unit_cost_usd_micros,
            quality,
            avg_latency_ms,
            available: true,
        }
    }
}

#[derive(Debug)]
struct ProviderEntry {
    descriptor: ProviderDescriptor,
    unavailable_until_epoch_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub descriptor: ProviderDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unavailable_until_epoch_seconds: Option<u64>,
}

/// Registration-ordered provider catalog with cooldown-based
/// availability. Cooldowns expire lazily on the next lookup; there is
/// no background timer.
pub struct ProviderRegistry {
    entries: RwLock<Vec<ProviderEntry>>,
    clock: Arc<dyn Clock>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            clock,
        }
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Vec<ProviderEntry>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, descriptor: ProviderDescriptor) -> Result<()> {
        let mut entries = self.write_entries();
        if entries.iter().any(|entry| {
            entry.descriptor.capability == descriptor.capability
                && entry.descriptor.name == descriptor.name
        }) {
            return Err(MedleyError::DuplicateProvider {
                name: descriptor.name,
                capability: descriptor.capability,
            });
        }
        entries.push(ProviderEntry {
            descriptor,
            unavailable_until_epoch_seconds: None,
        });
        Ok(())
    }

    /// Available providers for a capability, in registration order
    /// (ranking is the estimator's job). Expired cooldowns are cleared
    /// here, which is the only place availability flips back on without
    /// an explicit reset.
    pub fn list_providers(&self, capability: Capability) -> Vec<ProviderDescriptor> {
        let now = self.clock.now_epoch_seconds();
        let mut entries = self.write_entries();
        entries
            .iter_mut()
            .filter(|entry| entry.descriptor.capability == capability)
            .filter_map(|entry| {
                if let Some(until) = entry.unavailable_until_epoch_seconds {
                    if now >= until {
                        entry.unavailable_until_epoch_seconds = None;
                        entry.descriptor.available = true;
                    }
                }
                entry
                    .descriptor
                    .available
                    .then(|| entry.descriptor.clone())
            })
            .collect()
    }

    /// Excludes the named provider from lookups until the cooldown
    /// elapses. Sub-second cooldowns still cover at least one second.
    pub fn mark_unavailable(&self, name: &str, cooldown: Duration) {
        let until = self
            .clock
            .now_epoch_seconds()
            .saturating_add(cooldown.as_secs().max(1));
        let mut entries = self.write_entries();
        for entry in entries
            .iter_mut()
            .filter(|entry| entry.descriptor.name == name)
        {
            entry.descriptor.available = false;
            entry.unavailable_until_epoch_seconds = Some(until);
        }
    }

    /// Clears a cooldown early, re-enabling the provider immediately.
    pub fn reset(&self, name: &str) {
        let mut entries = self.write_entries();
        for entry in entries
            .iter_mut()
            .filter(|entry| entry.descriptor.name == name)
        {
            entry.descriptor.available = true;
            entry.unavailable_until_epoch_seconds = None;
        }
    }

    pub fn snapshot(&self) -> Vec<ProviderSnapshot> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .iter()
            .map(|entry| ProviderSnapshot {
                descriptor: entry.descriptor.clone(),
                unavailable_until_epoch_seconds: entry.unavailable_until_epoch_seconds,
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
