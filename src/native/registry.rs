use std::collections::HashMap;

use crate::object::method::NativeFn;

use super::{java_lang_Double, java_lang_Float, java_lang_Object, java_lang_System,
    java_lang_Thread};

macro_rules! native_functions {
    ($(
        {$owner:literal, $name_desc:literal, $native_fn:path}
    ),* $(,)?) => {
        impl NativeRegistry {
            pub fn new() -> Self {
                let mut fns: HashMap<&'static str, NativeFn> =
                    HashMap::with_capacity(Self::num_of_natives());
                $(
                    fns.insert(concat!($owner, "::", $name_desc), $native_fn as NativeFn);
                )*
                Self { fns }
            }

            const fn num_of_natives() -> usize {
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

native_functions!(
    {"java/lang/Object", "getClass()Ljava/lang/Class;", java_lang_Object::get_class},
    {"java/lang/Object", "hashCode()I", java_lang_Object::hash_code},

    {"java/lang/System", "currentTimeMillis()J", java_lang_System::current_time_millis},
    {"java/lang/System", "nanoTime()J", java_lang_System::nano_time},
    {"java/lang/System", "arraycopy(Ljava/lang/Object;ILjava/lang/Object;II)V", java_lang_System::arraycopy},
    {"java/lang/System", "identityHashCode(Ljava/lang/Object;)I", java_lang_System::identity_hash_code},

    {"java/lang/Float", "floatToRawIntBits(F)I", java_lang_Float::float_to_raw_int_bits},
    {"java/lang/Float", "intBitsToFloat(I)F", java_lang_Float::int_bits_to_float},
    {"java/lang/Double", "doubleToRawLongBits(D)J", java_lang_Double::double_to_raw_long_bits},
    {"java/lang/Double", "longBitsToDouble(J)D", java_lang_Double::long_bits_to_double},

    {"java/lang/Thread", "currentThread()Ljava/lang/Thread;", java_lang_Thread::current_thread},
);

/// In-process native registry, keyed by `(owner, name+descriptor)`. The
/// deferred binder consults it on a native method's first invocation.
pub(crate) struct NativeRegistry {
    fns: HashMap<&'static str, NativeFn>,
}

impl NativeRegistry {
    pub(crate) fn get(&self, owner: &str, name_desc: &str) -> Option<NativeFn> {
        let key = format!("{}::{}", owner, name_desc);
        return self.fns.get(key.as_str()).copied();
    }
}
