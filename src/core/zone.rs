// This module provides the zone: a named, arena-backed memory region that owns every
// transient object created while one function is compiled. It wraps a bumpalo Bump and
// exposes typed allocation helpers returning references bound to the zone lifetime, so the
// borrow checker rejects any use after the zone is released. The zone never runs
// destructors for the objects it holds; types stored in it must keep their storage in the
// zone as well (bumpalo collections, hashbrown maps using the zone allocator). A zone can
// be given an allocation limit, after which allocation panics with an out-of-memory error.
// The total number of bytes the zone has reserved is reported for peak-memory telemetry.

//! Arena-based compilation zone.
//!
//! All compilation objects are tied to the zone lifetime and released together
//! when the zone is dropped.

use bumpalo::Bump;
use std::fmt;

/// Named arena owning all transient objects of a single compilation.
pub struct Zone {
    /// Tag used in logs.
    name: &'static str,

    /// Arena allocator backing every allocation.
    bump: Bump,
}

impl Zone {
    /// Create a new zone without an allocation limit.
    pub fn new(name: &'static str) -> Self {
        log::trace!("zone '{}' created", name);
        Self {
            name,
            bump: Bump::new(),
        }
    }

    /// Create a zone that refuses to grow beyond `limit` bytes.
    ///
    /// Allocating past the limit panics with an out-of-memory error; the
    /// compilation is not recovered.
    pub fn with_allocation_limit(name: &'static str, limit: usize) -> Self {
        let zone = Self::new(name);
        zone.bump.set_allocation_limit(Some(limit));
        zone
    }

    /// Name this zone was tagged with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Underlying bump allocator, for zone-backed collections.
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Allocate an object in the zone.
    pub fn alloc<T>(&self, value: T) -> &mut T {
        self.bump.alloc(value)
    }

    /// Copy a slice into the zone.
    pub fn alloc_slice_copy<T: Copy>(&self, slice: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(slice)
    }

    /// Collect an exact-size iterator into a zone slice.
    pub fn alloc_slice_fill_iter<T, I>(&self, iter: I) -> &[T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.bump.alloc_slice_fill_iter(iter)
    }

    /// Copy a string into the zone.
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Total bytes reserved by this zone so far.
    pub fn allocation_size(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("name", &self.name)
            .field("allocation_size", &self.allocation_size())
            .finish()
    }
}

impl Drop for Zone {
    fn drop(&mut self) {
        log::trace!(
            "zone '{}' released ({} bytes)",
            self.name,
            self.bump.allocated_bytes()
        );
    }
}
