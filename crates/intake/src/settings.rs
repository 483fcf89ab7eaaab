//! Runtime-tunable intake knobs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 32 MiB, the in-memory ceiling for multipart bodies
pub const DEFAULT_MULTIPART_MEMORY: usize = 32 << 20;

/// Both knobs may be flipped while requests are in flight.
#[derive(Debug)]
pub struct IntakeSettings {
    strict_body_check: AtomicBool,
    multipart_memory: AtomicUsize,
}

impl IntakeSettings {
    pub fn builder() -> IntakeSettingsBuilder {
        IntakeSettingsBuilder::new()
    }

    /// Whether an empty json body is rejected as [`BodyRead`](crate::ErrorKind::BodyRead)
    pub fn strict_body_check(&self) -> bool {
        self.strict_body_check.load(Ordering::Relaxed)
    }

    pub fn set_strict_body_check(&self, strict: bool) {
        self.strict_body_check.store(strict, Ordering::Relaxed);
    }

    pub fn multipart_memory(&self) -> usize {
        self.multipart_memory.load(Ordering::Relaxed)
    }

    pub fn set_multipart_memory(&self, bytes: usize) {
        self.multipart_memory.store(bytes, Ordering::Relaxed);
    }
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone)]
pub struct IntakeSettingsBuilder {
    strict_body_check: bool,
    multipart_memory: usize,
}

impl IntakeSettingsBuilder {
    fn new() -> Self {
        Self { strict_body_check: false, multipart_memory: DEFAULT_MULTIPART_MEMORY }
    }

    pub fn strict_body_check(mut self, strict: bool) -> Self {
        self.strict_body_check = strict;
        self
    }

    pub fn multipart_memory(mut self, bytes: usize) -> Self {
        self.multipart_memory = bytes;
        self
    }

    pub fn build(self) -> IntakeSettings {
        IntakeSettings {
            strict_body_check: AtomicBool::new(self.strict_body_check),
            multipart_memory: AtomicUsize::new(self.multipart_memory),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn defaults() {
        let settings = IntakeSettings::default();
        assert!(!settings.strict_body_check());
        assert_eq!(settings.multipart_memory(), 32 * 1024 * 1024);
    }

    #[test]
    fn builder_and_runtime_toggle() {
        let settings = Arc::new(IntakeSettings::builder().strict_body_check(true).multipart_memory(1024).build());
        assert!(settings.strict_body_check());
        assert_eq!(settings.multipart_memory(), 1024);

        let shared = Arc::clone(&settings);
        std::thread::spawn(move || shared.set_strict_body_check(false)).join().unwrap();
        assert!(!settings.strict_body_check());
    }
}
