use crate::object::method::MethodPtr;
use crate::object::prelude::{JFloat, JInt};
use crate::thread::ThreadPtr;
use crate::value::JValue;

pub fn float_to_raw_int_bits(_thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    return JValue::with_int_val(args[1].float_val().to_bits() as JInt);
}

pub fn int_bits_to_float(_thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    return JValue::with_float_val(JFloat::from_bits(args[1].int_val() as u32));
}
