pub(crate) mod registry;
pub(crate) mod trapped;

#[allow(non_snake_case)]
mod java_lang_Double;
#[allow(non_snake_case)]
mod java_lang_Float;
#[allow(non_snake_case)]
mod java_lang_Object;
#[allow(non_snake_case)]
mod java_lang_System;
#[allow(non_snake_case)]
mod java_lang_Thread;
#[allow(non_snake_case)]
mod java_nio_Bits;
#[allow(non_snake_case)]
mod java_nio_charset_Charset;
#[allow(non_snake_case)]
mod java_util_concurrent_atomic_AtomicInteger;

pub(crate) use registry::NativeRegistry;
pub(crate) use trapped::TrappedMethods;

use crate::object::method::MethodPtr;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Inert body installed for `registerNatives()V` / `initIDs()V` and for
/// NOP traps.
pub fn nop(_thread: ThreadPtr, _method: MethodPtr, _args: &[JValue]) -> JValue {
    return JValue::default();
}

/// Deferred native binder. Installed as the callable body of an unbound
/// native method; the first invocation resolves the registry entry,
/// memoizes it on the method, and tail-calls it with the current arguments.
/// A missing entry surfaces as `UnsatisfiedLinkError` on the thread.
pub fn bind_and_invoke(thread: ThreadPtr, method: MethodPtr, args: &[JValue]) -> JValue {
    let mut method = method;
    match method.bind_native(thread) {
        Some(func) => func(thread, method, args),
        None => JValue::default(),
    }
}
