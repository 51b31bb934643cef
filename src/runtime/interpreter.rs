use crate::classfile::descriptor;
use crate::object::class::JClassPtr;
use crate::object::field::FieldPtr;
use crate::object::method::{MethodCode, MethodPtr};
use crate::runtime::stack::Frame;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Invocation dispatch plus a deliberately small bytecode engine. Native,
/// trapped, and NOP bodies are dispatched completely (including the
/// deferred binder and synchronized-method monitors); the bytecode side
/// covers the constant/local/static-field/return subset that trivial
/// `<clinit>` and `main` bodies need. Anything else raises
/// `InternalError` rather than pretending to execute.
pub struct Interpreter;

impl Interpreter {
    /// Cooperative invocation: schedules the call and hands the result to
    /// `done` once it has run.
    pub fn invoke(
        thread: ThreadPtr,
        method: MethodPtr,
        args: Vec<JValue>,
        done: Box<dyn FnOnce(JValue)>,
    ) {
        thread.vm().scheduler().schedule(Box::new(move || {
            let ret = Self::dispatch(thread, method, &args);
            done(ret);
        }));
    }

    /// Cooperative frame setup for the launch driver: schedules the
    /// invocation and reports whether it completed without a pending Java
    /// exception.
    pub fn setup_frame(
        thread: ThreadPtr,
        method: MethodPtr,
        args: Vec<JValue>,
        done: Box<dyn FnOnce(bool)>,
    ) {
        thread.vm().scheduler().schedule(Box::new(move || {
            let _ = Self::dispatch(thread, method, &args);
            done(!thread.has_pending_exception());
        }));
    }

    /// Synchronous entry point for natives and tests.
    pub fn call_sync(thread: ThreadPtr, method: MethodPtr, args: &[JValue]) -> JValue {
        return Self::dispatch(thread, method, args);
    }

    fn dispatch(thread: ThreadPtr, method: MethodPtr, raw_args: &[JValue]) -> JValue {
        match method.code() {
            MethodCode::Absent => {
                thread.throw_new_exception(
                    "java/lang/AbstractMethodError",
                    &method.full_signature(),
                );
                return JValue::default();
            }
            MethodCode::Bytecode(_) => Self::execute_bytecode(thread, method, raw_args),
            _ => Self::invoke_native(thread, method, raw_args),
        }
    }

    fn invoke_native(thread: ThreadPtr, method: MethodPtr, raw_args: &[JValue]) -> JValue {
        let args = method.convert_args(thread, raw_args);
        let lock = if method.is_synchronized() {
            let monitor = method.method_lock(thread, raw_args);
            monitor.enter();
            Some(monitor)
        } else {
            None
        };
        let func = method.native_fn();
        let ret = func(thread, method, &args);
        if let Some(monitor) = lock {
            monitor.exit();
        }
        return ret;
    }

    fn execute_bytecode(thread: ThreadPtr, method: MethodPtr, raw_args: &[JValue]) -> JValue {
        let lock = if method.is_synchronized() {
            let monitor = method.method_lock(thread, raw_args);
            monitor.enter();
            Some(monitor)
        } else {
            None
        };
        let mut thread_mut = thread;
        thread_mut.push_frame(Frame::new(method, raw_args));
        let ret = Self::run(thread, method);
        thread_mut.pop_frame();
        if let Some(monitor) = lock {
            monitor.exit();
        }
        return ret;
    }

    fn run(thread: ThreadPtr, method: MethodPtr) -> JValue {
        let code_attr = method.code_attribute();
        let code = &code_attr.code;
        let mut thread_mut = thread;
        let frame = thread_mut.top_frame_mut();
        let mut pc = 0usize;
        loop {
            if pc >= code.len() {
                thread.throw_new_exception(
                    "java/lang/InternalError",
                    &format!("pc fell off the end of {}", method.full_signature()),
                );
                return JValue::default();
            }
            frame.set_pc(pc);
            let op = code[pc];
            pc += 1;
            match op {
                // nop
                0x00 => {}
                // aconst_null
                0x01 => frame.stack().push(JValue::with_obj_null()),
                // iconst_m1 .. iconst_5
                0x02..=0x08 => frame
                    .stack()
                    .push(JValue::with_int_val(op as i32 - 3)),
                // bipush
                0x10 => {
                    let val = code[pc] as i8;
                    pc += 1;
                    frame.stack().push(JValue::with_int_val(val as i32));
                }
                // sipush
                0x11 => {
                    let val = i16::from_be_bytes([code[pc], code[pc + 1]]);
                    pc += 2;
                    frame.stack().push(JValue::with_int_val(val as i32));
                }
                // iload / aload
                0x15 | 0x19 => {
                    let index = code[pc] as usize;
                    pc += 1;
                    let val = frame.local(index);
                    frame.stack().push(val);
                }
                // iload_0 .. iload_3
                0x1a..=0x1d => {
                    let val = frame.local((op - 0x1a) as usize);
                    frame.stack().push(val);
                }
                // aload_0 .. aload_3
                0x2a..=0x2d => {
                    let val = frame.local((op - 0x2a) as usize);
                    frame.stack().push(val);
                }
                // istore / astore
                0x36 | 0x3a => {
                    let index = code[pc] as usize;
                    pc += 1;
                    let val = frame.stack().pop();
                    frame.set_local(index, val);
                }
                // istore_0 .. istore_3
                0x3b..=0x3e => {
                    let val = frame.stack().pop();
                    frame.set_local((op - 0x3b) as usize, val);
                }
                // astore_0 .. astore_3
                0x4b..=0x4e => {
                    let val = frame.stack().pop();
                    frame.set_local((op - 0x4b) as usize, val);
                }
                // ireturn / areturn
                0xac | 0xb0 => return frame.stack().pop(),
                // return
                0xb1 => return JValue::default(),
                // getstatic
                0xb2 => {
                    let cp_index = u16::from_be_bytes([code[pc], code[pc + 1]]);
                    pc += 2;
                    let (class, field) = match Self::resolve_static_field(thread, method, cp_index)
                    {
                        Some(resolved) => resolved,
                        None => return JValue::default(),
                    };
                    let val = class.static_get(field);
                    if descriptor::word_size(field.descriptor().as_str()) == 2 {
                        frame.stack().push_wide(val);
                    } else {
                        frame.stack().push(val);
                    }
                }
                // putstatic
                0xb3 => {
                    let cp_index = u16::from_be_bytes([code[pc], code[pc + 1]]);
                    pc += 2;
                    let (class, field) = match Self::resolve_static_field(thread, method, cp_index)
                    {
                        Some(resolved) => resolved,
                        None => return JValue::default(),
                    };
                    let val = if descriptor::word_size(field.descriptor().as_str()) == 2 {
                        frame.stack().pop_wide()
                    } else {
                        frame.stack().pop()
                    };
                    class.static_set(field, val);
                }
                _ => {
                    thread.throw_new_exception(
                        "java/lang/InternalError",
                        &format!(
                            "unsupported opcode 0x{:02x} in {}",
                            op,
                            method.full_signature()
                        ),
                    );
                    return JValue::default();
                }
            }
        }
    }

    /// Static field resolution for the bytecode subset. The owning class is
    /// used directly while its own `<clinit>` runs; other classes must
    /// already be loaded.
    fn resolve_static_field(
        thread: ThreadPtr,
        method: MethodPtr,
        cp_index: u16,
    ) -> Option<(JClassPtr, FieldPtr)> {
        let owner = method.owner();
        let cp = owner.constant_pool();
        let (class_name, field_name, _descriptor) = cp.get_field_ref(cp_index);
        let target = if class_name == owner.name() {
            owner
        } else {
            let target = thread
                .vm()
                .bootstrap_class_loader()
                .find_loaded_by_name(class_name.as_str(), thread);
            if target.is_null() {
                thread.throw_new_exception(
                    "java/lang/NoClassDefFoundError",
                    class_name.as_str(),
                );
                return None;
            }
            target
        };
        match target.find_field(field_name) {
            Some(field) if field.is_static() => Some((field.owner(), field)),
            _ => {
                thread.throw_new_exception("java/lang/NoSuchFieldError", field_name.as_str());
                return None;
            }
        }
    }
}
