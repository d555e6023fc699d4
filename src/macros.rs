//! Lock helper macros shared across the crate.
//!
//! The property maps of [`crate::DynamicBean`] are guarded by standard library read/write
//! locks. These macros keep the acquisition sites short. A poisoned lock means a panic happened
//! while a writer held it, and the guarded state can no longer be trusted, so the macros panic
//! as well.

macro_rules! read_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.read().expect("Failed to acquire read lock")
    };
}

macro_rules! write_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.write().expect("Failed to acquire write lock")
    };
}
