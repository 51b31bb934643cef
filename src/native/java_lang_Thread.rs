use crate::object::method::MethodPtr;
use crate::thread::ThreadPtr;
use crate::value::JValue;

pub fn current_thread(thread: ThreadPtr, _method: MethodPtr, _args: &[JValue]) -> JValue {
    return JValue::with_obj_val(thread.j_thread_obj());
}
