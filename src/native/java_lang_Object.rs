use crate::object::method::MethodPtr;
use crate::object::prelude::JInt;
use crate::thread::ThreadPtr;
use crate::value::JValue;

pub fn get_class(thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let receiver = args[1].obj_val();
    return JValue::with_obj_val(receiver.class().get_class_object(thread));
}

pub fn hash_code(_thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let receiver = args[1].obj_val();
    return JValue::with_int_val(receiver.as_usize() as JInt);
}
