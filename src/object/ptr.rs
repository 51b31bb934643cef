use crate::memory::Address;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};

/// Raw, copyable handle to a heap-resident runtime structure. Everything it
/// points at lives in the permanent space, so handles never dangle while the
/// VM is alive. Equality and hashing are by identity.
pub struct Ptr<T> {
    ptr: *mut T,
}

impl<T> Ptr<T> {
    pub const fn new(ptr: *mut T) -> Ptr<T> {
        Ptr { ptr }
    }

    pub const fn from_addr(addr: Address) -> Ptr<T> {
        Ptr {
            ptr: addr.raw_ptr() as _,
        }
    }

    pub fn from_ref(v: &T) -> Ptr<T> {
        Ptr {
            ptr: v as *const T as _,
        }
    }

    pub const fn null() -> Ptr<T> {
        Ptr {
            ptr: std::ptr::null_mut(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn is_not_null(&self) -> bool {
        !self.ptr.is_null()
    }

    pub fn cast<S>(&self) -> Ptr<S> {
        Ptr {
            ptr: self.ptr as *mut S,
        }
    }

    pub fn as_mut_ptr(&self) -> *mut T {
        self.ptr
    }

    pub fn as_ref<'a>(&self) -> &'a T {
        debug_assert!(self.is_not_null());
        unsafe { &*self.ptr }
    }

    pub fn as_mut_ref<'a>(&self) -> &'a mut T {
        debug_assert!(self.is_not_null());
        unsafe { &mut *self.ptr }
    }

    pub fn as_address(&self) -> Address {
        Address::new(self.ptr.cast())
    }

    pub fn as_usize(&self) -> usize {
        self.ptr as usize
    }
}

impl<T> Deref for Ptr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        debug_assert!(self.is_not_null());
        unsafe { &*self.ptr }
    }
}

impl<T> DerefMut for Ptr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        debug_assert!(self.is_not_null());
        unsafe { &mut *self.ptr }
    }
}

impl<T> Copy for Ptr<T> {}

impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Ptr<T> {
        *self
    }
}

impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Ptr<T>) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.ptr as usize).hash(state);
    }
}

impl<T> std::fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ptr(0x{:x})", self.ptr as usize)
    }
}
