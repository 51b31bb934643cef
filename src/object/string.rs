use std::cell::RefCell;
use std::collections::HashMap;

use super::ptr::Ptr;
use crate::memory::heap::Heap;

/// Runtime `java/lang/String`. The class library owns real string objects;
/// the core only needs a heap-resident value with an interning table for
/// reflection mirror names.
pub struct JString {
    value: String,
}

pub type JStringPtr = Ptr<JString>;

impl JString {
    pub fn as_str(&self) -> &str {
        return &self.value;
    }

    pub fn len(&self) -> usize {
        return self.value.len();
    }
}

pub struct StringTable {
    heap: Ptr<Heap>,
    table: RefCell<HashMap<String, JStringPtr>>,
}

impl StringTable {
    pub fn new(heap: Ptr<Heap>) -> Self {
        return Self {
            heap,
            table: RefCell::new(HashMap::new()),
        };
    }

    /// Interning constructor: one `JString` per distinct content.
    pub fn intern(&self, content: &str) -> JStringPtr {
        debug_assert!(self.heap.is_not_null());
        let mut table = self.table.borrow_mut();
        if let Some(jstr) = table.get(content) {
            return *jstr;
        }
        let jstr = self.heap.alloc(JString {
            value: content.to_string(),
        });
        table.insert(content.to_string(), jstr);
        return jstr;
    }

    /// Non-interning constructor for ordinary runtime strings.
    pub fn create(&self, content: &str) -> JStringPtr {
        debug_assert!(self.heap.is_not_null());
        return self.heap.alloc(JString {
            value: content.to_string(),
        });
    }
}

impl Default for StringTable {
    fn default() -> Self {
        return Self {
            heap: Ptr::null(),
            table: RefCell::new(HashMap::new()),
        };
    }
}
