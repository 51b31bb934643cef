use crate::object::method::MethodPtr;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Trap body for the `Charset$3` privileged action: the charset-provider
/// lookup it performs has nothing to find here, and null is the documented
/// "no provider" answer.
pub fn charset_3_run(_thread: ThreadPtr, _method: MethodPtr, _args: &[JValue]) -> JValue {
    return JValue::with_obj_null();
}
