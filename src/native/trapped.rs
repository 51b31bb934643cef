use std::collections::HashMap;

use crate::object::method::NativeFn;

use super::{java_lang_System, java_nio_Bits, java_nio_charset_Charset,
    java_util_concurrent_atomic_AtomicInteger, nop};

macro_rules! trapped_methods {
    ($(
        {$owner:literal, $name_desc:literal, $trap_fn:path}
    ),* $(,)?) => {
        impl TrappedMethods {
            pub fn new() -> Self {
                let mut fns: HashMap<&'static str, NativeFn> =
                    HashMap::with_capacity(Self::num_of_traps());
                $(
                    fns.insert(concat!($owner, "::", $name_desc), $trap_fn as NativeFn);
                )*
                Self { fns }
            }

            const fn num_of_traps() -> usize {
                let mut num = 0;
                $(
                    let _ = $name_desc;
                    num += 1;
                )*
                return num;
            }
        }
    };
}

// Methods replaced regardless of whether a real implementation exists.
// `Reference.<clinit>` would start the reference-handler thread and
// `Terminator.setup` would install signal handlers; neither makes sense on
// a single cooperative executor.
trapped_methods!(
    {"java/lang/ref/Reference", "<clinit>()V", nop},
    {"java/lang/System", "loadLibrary(Ljava/lang/String;)V", java_lang_System::load_library},
    {"java/lang/Terminator", "setup()V", nop},
    {"java/util/concurrent/atomic/AtomicInteger", "compareAndSet(II)Z", java_util_concurrent_atomic_AtomicInteger::compare_and_set},
    {"java/nio/Bits", "byteOrder()Ljava/nio/ByteOrder;", java_nio_Bits::byte_order},
    {"java/nio/Bits", "copyToByteArray(JLjava/lang/Object;JJ)V", java_nio_Bits::copy_to_byte_array},
    {"java/nio/charset/Charset$3", "run()Ljava/lang/Object;", java_nio_charset_Charset::charset_3_run},
);

/// Compile-time table of trapped methods, keyed like the native registry.
/// Consulted once per method, at parse time.
pub(crate) struct TrappedMethods {
    fns: HashMap<&'static str, NativeFn>,
}

impl TrappedMethods {
    pub(crate) fn get(&self, owner: &str, name_desc: &str) -> Option<NativeFn> {
        let key = format!("{}::{}", owner, name_desc);
        return self.fns.get(key.as_str()).copied();
    }
}
