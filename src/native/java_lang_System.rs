use std::time::SystemTime;

use crate::object::method::MethodPtr;
use crate::object::prelude::JInt;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Libraries the runtime pretends to load; everything else is genuinely
/// unsatisfiable.
const KNOWN_LIBRARIES: [&str; 5] = ["zip", "net", "nio", "awt", "fontmanager"];

/// Trap body. `System.loadLibrary` must not reach a real dynamic linker.
pub fn load_library(thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let lib_name = args[1].str_val();
    if lib_name.is_null() {
        thread.throw_new_exception("java/lang/NullPointerException", "library name");
        return JValue::default();
    }
    if !KNOWN_LIBRARIES.contains(&lib_name.as_str()) {
        thread.throw_new_exception(
            "java/lang/UnsatisfiedLinkError",
            &format!("no {} in java.library.path", lib_name.as_str()),
        );
    }
    return JValue::default();
}

pub fn current_time_millis(_thread: ThreadPtr, _method: MethodPtr, _args: &[JValue]) -> JValue {
    let millis = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_millis();
    return JValue::with_long_val(millis as _);
}

pub fn nano_time(_thread: ThreadPtr, _method: MethodPtr, _args: &[JValue]) -> JValue {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    return JValue::with_long_val(nanos as _);
}

pub fn arraycopy(thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let src = args[1].arr_val();
    let src_pos = args[2].int_val();
    let mut dest = args[3].arr_val();
    let dest_pos = args[4].int_val();
    let length = args[5].int_val();
    if src.is_null() || dest.is_null() {
        thread.throw_new_exception("java/lang/NullPointerException", "arraycopy");
        return JValue::default();
    }
    if src_pos < 0
        || dest_pos < 0
        || length < 0
        || src_pos + length > src.length()
        || dest_pos + length > dest.length()
    {
        thread.throw_new_exception("java/lang/IndexOutOfBoundsException", "arraycopy");
        return JValue::default();
    }
    // src and dest may alias; stage through a scratch buffer.
    let staged: Vec<JValue> = (0..length).map(|i| src.get(src_pos + i)).collect();
    for (i, val) in staged.into_iter().enumerate() {
        dest.set(dest_pos + i as JInt, val);
    }
    return JValue::default();
}

pub fn identity_hash_code(_thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let obj = args[1].obj_val();
    return JValue::with_int_val(obj.as_usize() as JInt);
}
