use std::sync::atomic::{AtomicIsize, Ordering};

use crate::memory::{is_align_of, Address};

static PAGE_SIZE: AtomicIsize = AtomicIsize::new(-1);

pub fn init() {
    #[cfg(target_family = "unix")]
    unsafe {
        PAGE_SIZE.store(libc::sysconf(libc::_SC_PAGESIZE) as isize, Ordering::Relaxed);
    }
}

pub fn page_size() -> usize {
    let page_size = PAGE_SIZE.load(Ordering::Relaxed);
    if page_size == -1 {
        panic!("must call os::init() prior to using it");
    }
    return page_size as usize;
}

pub fn reserve_memory(size: usize) -> Address {
    debug_assert!(is_align_of(size, page_size()));
    #[cfg(target_family = "unix")]
    {
        let res = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if res == libc::MAP_FAILED {
            return Address::null();
        } else {
            return Address::from_c_ptr(res);
        }
    }
    #[cfg(not(target_family = "unix"))]
    {
        todo!();
    }
}

pub fn release_memory(addr: Address, size: usize) {
    debug_assert!(addr.is_not_null());
    #[cfg(target_family = "unix")]
    unsafe {
        libc::munmap(addr.as_mut_raw_ptr() as _, size);
    }
    #[cfg(not(target_family = "unix"))]
    {
        let _ = size;
        todo!();
    }
}
