// This module defines the WebAssembly feature flags. WasmFeatureSet is a plain copyable bit
// set used for the features a module is allowed to use. DetectedFeatures is the one piece
// of mutable state shared between concurrent compilations of the same module: backends
// record the features compiled code actually relies on. It is an atomic bit set and every
// update is a fetch_or, so concurrent writers only ever take the union of their
// detections, which is commutative and independent of ordering.

//! Enabled and detected WebAssembly features.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Post-MVP proposals a module or function may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WasmFeature {
    Simd = 0,
    RelaxedSimd,
    ExceptionHandling,
    ReferenceTypes,
    Gc,
    Memory64,
    MultiMemory,
    ReturnCall,
    Stringref,
    ImportedStrings,
}

impl WasmFeature {
    pub const ALL: [WasmFeature; 10] = [
        WasmFeature::Simd,
        WasmFeature::RelaxedSimd,
        WasmFeature::ExceptionHandling,
        WasmFeature::ReferenceTypes,
        WasmFeature::Gc,
        WasmFeature::Memory64,
        WasmFeature::MultiMemory,
        WasmFeature::ReturnCall,
        WasmFeature::Stringref,
        WasmFeature::ImportedStrings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WasmFeature::Simd => "simd",
            WasmFeature::RelaxedSimd => "relaxed_simd",
            WasmFeature::ExceptionHandling => "exception_handling",
            WasmFeature::ReferenceTypes => "reference_types",
            WasmFeature::Gc => "gc",
            WasmFeature::Memory64 => "memory64",
            WasmFeature::MultiMemory => "multi_memory",
            WasmFeature::ReturnCall => "return_call",
            WasmFeature::Stringref => "stringref",
            WasmFeature::ImportedStrings => "imported_strings",
        }
    }

    fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Copyable set of features.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WasmFeatureSet(u32);

impl WasmFeatureSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        WasmFeature::ALL.into_iter().collect()
    }

    pub fn add(&mut self, feature: WasmFeature) {
        self.0 |= feature.bit();
    }

    pub fn contains(&self, feature: WasmFeature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn union(self, other: WasmFeatureSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = WasmFeature> {
        let set = *self;
        WasmFeature::ALL.into_iter().filter(move |f| set.contains(*f))
    }
}

impl FromIterator<WasmFeature> for WasmFeatureSet {
    fn from_iter<I: IntoIterator<Item = WasmFeature>>(iter: I) -> Self {
        let mut set = Self::empty();
        for feature in iter {
            set.add(feature);
        }
        set
    }
}

impl fmt::Debug for WasmFeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(WasmFeature::name)).finish()
    }
}

/// Features observed while compiling, shared by sibling compilations.
#[derive(Default)]
pub struct DetectedFeatures(AtomicU32);

impl DetectedFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, feature: WasmFeature) {
        self.0.fetch_or(feature.bit(), Ordering::Relaxed);
    }

    /// Union `features` into the detected set.
    pub fn merge(&self, features: WasmFeatureSet) {
        self.0.fetch_or(features.0, Ordering::Relaxed);
    }

    pub fn contains(&self, feature: WasmFeature) -> bool {
        self.snapshot().contains(feature)
    }

    pub fn snapshot(&self) -> WasmFeatureSet {
        WasmFeatureSet(self.0.load(Ordering::Relaxed))
    }
}

impl fmt::Debug for DetectedFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DetectedFeatures")
            .field(&self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_feature_set() {
        let mut set = WasmFeatureSet::empty();
        assert!(set.is_empty());
        set.add(WasmFeature::Simd);
        set.add(WasmFeature::Gc);

        assert!(set.contains(WasmFeature::Simd));
        assert!(!set.contains(WasmFeature::Memory64));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![WasmFeature::Simd, WasmFeature::Gc]);
        assert_eq!(format!("{:?}", set), "{\"simd\", \"gc\"}");

        let all = WasmFeatureSet::all();
        assert!(WasmFeature::ALL.iter().all(|f| all.contains(*f)));
    }

    #[test]
    fn test_detected_features_union() {
        let detected = DetectedFeatures::new();
        detected.add(WasmFeature::ReturnCall);
        detected.merge([WasmFeature::Simd, WasmFeature::ReturnCall].into_iter().collect());

        let snapshot = detected.snapshot();
        assert!(snapshot.contains(WasmFeature::Simd));
        assert!(snapshot.contains(WasmFeature::ReturnCall));
        assert_eq!(snapshot.iter().count(), 2);
    }

    #[test]
    fn test_detected_features_concurrent_writers() {
        let detected = Arc::new(DetectedFeatures::new());
        let handles: Vec<_> = WasmFeature::ALL
            .into_iter()
            .map(|feature| {
                let detected = Arc::clone(&detected);
                std::thread::spawn(move || detected.add(feature))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(detected.snapshot(), WasmFeatureSet::all());
    }
}
