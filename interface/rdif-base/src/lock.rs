//! Shared ownership of a driver instance.
//!
//! The device owner keeps the only [`Lock`]; everyone else holds a
//! [`LockWeak`], which stops upgrading once the owner drops the device.

use alloc::sync::{Arc, Weak};
use core::ops::{Deref, DerefMut};

use spin::{Mutex, MutexGuard};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    #[error("device is locked by another user")]
    Busy,
    #[error("device released")]
    DeviceReleased,
}

pub struct Lock<T: ?Sized> {
    data: Arc<Mutex<T>>,
}

impl<T> Lock<T> {
    pub fn new(data: T) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
        }
    }
}

impl<T: ?Sized> Lock<T> {
    /// Spins until the device is free.
    pub fn lock(&self) -> LockGuard<'_, T> {
        LockGuard {
            inner: self.data.lock(),
        }
    }

    pub fn try_lock(&self) -> Result<LockGuard<'_, T>, LockError> {
        self.data
            .try_lock()
            .map(|inner| LockGuard { inner })
            .ok_or(LockError::Busy)
    }

    pub fn weak(&self) -> LockWeak<T> {
        LockWeak {
            data: Arc::downgrade(&self.data),
        }
    }
}

impl<T: ?Sized> Clone for Lock<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

pub struct LockWeak<T: ?Sized> {
    data: Weak<Mutex<T>>,
}

impl<T: ?Sized> LockWeak<T> {
    pub fn upgrade(&self) -> Option<Lock<T>> {
        self.data.upgrade().map(|data| Lock { data })
    }

    pub fn is_released(&self) -> bool {
        self.data.strong_count() == 0
    }
}

impl<T: ?Sized> Clone for LockWeak<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
        }
    }
}

pub struct LockGuard<'a, T: ?Sized> {
    inner: MutexGuard<'a, T>,
}

impl<T: ?Sized> Deref for LockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: ?Sized> DerefMut for LockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
