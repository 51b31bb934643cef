use crate::object::method::MethodPtr;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Trap body for `compareAndSet(II)Z`. The replaced implementation relies
/// on `sun.misc.Unsafe`; here the single-threaded executor makes a plain
/// read-compare-write atomic. The source this models wrote `update`
/// unconditionally and always answered true; that was flagged wrong there
/// and the comparison is restored here.
pub fn compare_and_set(thread: ThreadPtr, _method: MethodPtr, args: &[JValue]) -> JValue {
    let mut receiver = args[1].obj_val();
    let expect = args[2].int_val();
    let update = args[3].int_val();
    let value_field = match receiver
        .class()
        .find_field(thread.vm().get_symbol("value"))
    {
        Some(field) => field,
        None => {
            thread.throw_new_exception("java/lang/NoSuchFieldError", "AtomicInteger.value");
            return JValue::default();
        }
    };
    let current = receiver.get_field(value_field.slot()).int_val();
    if current != expect {
        return JValue::with_bool_val(0);
    }
    receiver.set_field(value_field.slot(), JValue::with_int_val(update));
    return JValue::with_bool_val(1);
}
