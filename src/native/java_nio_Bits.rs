use crate::memory::Address;
use crate::object::method::MethodPtr;
use crate::object::prelude::JInt;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Trap body for `byteOrder()Ljava/nio/ByteOrder;`: answers the static
/// `LITTLE_ENDIAN` of `java/nio/ByteOrder`, which must already be
/// initialized by the time user code asks.
pub fn byte_order(thread: ThreadPtr, _method: MethodPtr, _args: &[JValue]) -> JValue {
    let vm = thread.vm();
    let byte_order_cls = vm
        .bootstrap_class_loader()
        .get_initialized_class(thread, "Ljava/nio/ByteOrder;");
    if byte_order_cls.is_null() {
        thread.throw_new_exception(
            "java/lang/InternalError",
            "java/nio/ByteOrder is not initialized",
        );
        return JValue::default();
    }
    let little_endian = match byte_order_cls.find_field(vm.get_symbol("LITTLE_ENDIAN")) {
        Some(field) => field,
        None => {
            thread.throw_new_exception("java/lang/NoSuchFieldError", "ByteOrder.LITTLE_ENDIAN");
            return JValue::default();
        }
    };
    return byte_order_cls.static_get(little_endian);
}

/// Trap body for `copyToByteArray(JLjava/lang/Object;JJ)V`: copies `length`
/// bytes from the raw heap address `src_addr` into the byte array `dst`
/// starting at `dst_pos`.
pub fn copy_to_byte_array(thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let src_addr = args[1].long_val();
    let mut dst = args[2].arr_val();
    let dst_pos = args[3].long_val();
    let length = args[4].long_val();
    if dst.is_null() {
        thread.throw_new_exception("java/lang/NullPointerException", "copyToByteArray");
        return JValue::default();
    }
    if dst_pos < 0 || length < 0 || dst_pos + length > dst.length() as i64 {
        thread.throw_new_exception("java/lang/IndexOutOfBoundsException", "copyToByteArray");
        return JValue::default();
    }
    let vm = thread.vm();
    let heap = vm.heap();
    for i in 0..length {
        let byte = heap.get_byte(Address::from_isize((src_addr + i) as isize));
        dst.set_byte((dst_pos + i) as JInt, byte);
    }
    return JValue::default();
}
