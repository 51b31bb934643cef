use crate::object::method::MethodPtr;
use crate::object::prelude::{JDouble, JLong};
use crate::thread::ThreadPtr;
use crate::value::JValue;

pub fn double_to_raw_long_bits(_thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    return JValue::with_long_val(args[1].double_val().to_bits() as JLong);
}

pub fn long_bits_to_double(_thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    return JValue::with_double_val(JDouble::from_bits(args[1].long_val() as u64));
}
