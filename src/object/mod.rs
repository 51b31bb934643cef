pub mod array;
pub mod class;
pub mod constant_pool;
pub mod field;
pub mod member;
pub mod method;
pub mod prelude;
pub mod ptr;
pub mod reflection;
pub mod string;
pub mod symbol;

use std::cell::Cell;

use self::class::JClassPtr;
use self::ptr::Ptr;
use crate::thread::ThreadPtr;
use crate::value::JValue;

pub type ObjectPtr = Ptr<JObject>;
pub type MonitorPtr = Ptr<Monitor>;

/// Entry-counting monitor. The executor is single-threaded, so a monitor is
/// never contended; enter/exit still track recursion for happens-before
/// bookkeeping and for tests.
pub struct Monitor {
    entry_count: Cell<u32>,
}

impl Monitor {
    pub fn new() -> Monitor {
        return Monitor {
            entry_count: Cell::new(0),
        };
    }

    pub fn enter(&self) {
        self.entry_count.set(self.entry_count.get() + 1);
    }

    pub fn exit(&self) {
        debug_assert!(self.entry_count.get() > 0);
        self.entry_count.set(self.entry_count.get() - 1);
    }

    pub fn is_locked(&self) -> bool {
        return self.entry_count.get() > 0;
    }
}

/// A plain Java instance: its class plus slot-indexed field storage.
pub struct JObject {
    class: JClassPtr,
    fields: Vec<JValue>,
    monitor: Monitor,
}

impl JObject {
    pub fn new(class: JClassPtr, thread: ThreadPtr) -> ObjectPtr {
        let num_slots = if class.is_not_null() {
            class.instance_slot_count()
        } else {
            0
        };
        let mut fields = Vec::with_capacity(num_slots);
        fields.resize_with(num_slots, JValue::default);
        return thread.vm().heap().alloc(JObject {
            class,
            fields,
            monitor: Monitor::new(),
        });
    }

    pub fn class(&self) -> JClassPtr {
        return self.class;
    }

    pub fn get_field(&self, slot: i32) -> JValue {
        return self.fields[slot as usize];
    }

    pub fn set_field(&mut self, slot: i32, val: JValue) {
        self.fields[slot as usize] = val;
    }

    pub fn monitor(&self) -> MonitorPtr {
        return MonitorPtr::from_ref(&self.monitor);
    }
}

/// A thrown Java exception as the core models it: the exception class name
/// plus its detail message. Real exception objects belong to the class
/// library, which is not part of this runtime.
pub struct JavaException {
    class_name: self::symbol::SymbolPtr,
    message: String,
}

pub type JavaExceptionPtr = Ptr<JavaException>;

impl JavaException {
    pub fn new(
        class_name: self::symbol::SymbolPtr,
        message: String,
        thread: ThreadPtr,
    ) -> JavaExceptionPtr {
        return thread.vm().heap().alloc(JavaException {
            class_name,
            message,
        });
    }

    pub fn class_name(&self) -> self::symbol::SymbolPtr {
        return self.class_name;
    }

    pub fn message(&self) -> &str {
        return &self.message;
    }
}
