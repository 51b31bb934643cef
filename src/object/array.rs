use super::prelude::*;
use super::Monitor;
use crate::thread::ThreadPtr;
use crate::value::JValue;

/// Runtime array: element descriptor plus slot-per-element storage. Wide
/// elements still take a single slot here; only the operand stack uses the
/// two-slot convention.
pub struct JArray {
    elem_descriptor: SymbolPtr,
    elems: Vec<JValue>,
    monitor: Monitor,
}

pub type JArrayPtr = Ptr<JArray>;

impl JArray {
    pub fn new(elem_descriptor: SymbolPtr, length: JInt, thread: ThreadPtr) -> JArrayPtr {
        let mut elems = Vec::with_capacity(length as usize);
        elems.resize_with(length as usize, JValue::default);
        return thread.vm().heap().alloc(JArray {
            elem_descriptor,
            elems,
            monitor: Monitor::new(),
        });
    }

    pub fn from_bytes(bytes: &[u8], thread: ThreadPtr) -> JArrayPtr {
        let elem_descriptor = thread.vm().get_symbol("B");
        let elems = bytes
            .iter()
            .map(|b| JValue::with_byte_val(*b as JByte))
            .collect();
        return thread.vm().heap().alloc(JArray {
            elem_descriptor,
            elems,
            monitor: Monitor::new(),
        });
    }

    pub fn elem_descriptor(&self) -> SymbolPtr {
        return self.elem_descriptor;
    }

    pub fn length(&self) -> JInt {
        return self.elems.len() as JInt;
    }

    pub fn get(&self, index: JInt) -> JValue {
        return self.elems[index as usize];
    }

    pub fn set(&mut self, index: JInt, val: JValue) {
        self.elems[index as usize] = val;
    }

    pub fn get_byte(&self, index: JInt) -> JByte {
        return self.elems[index as usize].byte_val();
    }

    pub fn set_byte(&mut self, index: JInt, val: JByte) {
        self.elems[index as usize] = JValue::with_byte_val(val);
    }

    pub fn monitor(&self) -> super::MonitorPtr {
        return super::MonitorPtr::from_ref(&self.monitor);
    }
}
