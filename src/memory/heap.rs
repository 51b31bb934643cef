use std::cell::Cell;
use std::mem::{align_of, size_of};

use super::{align_of as align_up, Address, MB};
use crate::object::prelude::JByte;
use crate::object::ptr::Ptr;
use crate::os;

const PERM_SPACE_SIZE: usize = 64 * MB;

/// A GC-less bump space. Everything allocated here lives until the VM is
/// destroyed; values are placed fully built and never dropped.
struct Space {
    base: Address,
    end: Address,
    top: Cell<Address>,
}

impl Space {
    fn new(size: usize) -> Space {
        let size = align_up(size, os::page_size());
        let base = os::reserve_memory(size);
        if base.is_null() {
            panic!("cannot reserve {} bytes for the heap", size);
        }
        return Space {
            base,
            end: base.uoffset(size),
            top: Cell::new(base),
        };
    }

    fn alloc(&self, size: usize, align: usize) -> Address {
        let top = align_up(self.top.get().as_usize(), align);
        let new_top = top + size;
        if new_top > self.end.as_usize() {
            panic!("permanent space exhausted");
        }
        self.top.set(Address::from_usize(new_top));
        return Address::from_usize(top);
    }

    fn contains(&self, addr: Address) -> bool {
        return addr >= self.base && addr < self.top.get();
    }

    fn destroy(&self) {
        os::release_memory(self.base, self.end.as_usize() - self.base.as_usize());
    }
}

pub struct Heap {
    perm_space: Space,
}

impl Heap {
    pub fn new() -> Heap {
        return Heap {
            perm_space: Space::new(PERM_SPACE_SIZE),
        };
    }

    /// Places a fully built value into the permanent space and hands back a
    /// stable handle. The value is never dropped.
    pub fn alloc<T>(&self, val: T) -> Ptr<T> {
        let addr = self.perm_space.alloc(size_of::<T>(), align_of::<T>());
        let ptr = addr.as_mut_raw_ptr() as *mut T;
        unsafe {
            std::ptr::write(ptr, val);
        }
        return Ptr::new(ptr);
    }

    /// Copies raw bytes into the permanent space. Used by tests and by
    /// trapped natives that hand out raw heap addresses.
    pub fn alloc_bytes(&self, bytes: &[u8]) -> Address {
        let addr = self.perm_space.alloc(bytes.len().max(1), 1);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), addr.as_mut_raw_ptr(), bytes.len());
        }
        return addr;
    }

    pub fn get_byte(&self, addr: Address) -> JByte {
        debug_assert!(self.contains(addr));
        return unsafe { *(addr.raw_ptr() as *const JByte) };
    }

    pub fn contains(&self, addr: Address) -> bool {
        return self.perm_space.contains(addr);
    }

    pub fn destroy(&self) {
        self.perm_space.destroy();
    }
}
