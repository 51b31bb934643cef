use std::cell::RefCell;
use std::collections::HashMap;

use super::ptr::Ptr;
use crate::memory::heap::Heap;

/// Interned UTF-8 name or descriptor. Symbols live in the permanent space
/// and are unique per content, so equality is pointer identity.
pub struct Symbol {
    value: String,
}

pub type SymbolPtr = Ptr<Symbol>;

impl Symbol {
    pub fn as_str(&self) -> &str {
        return &self.value;
    }

    pub fn as_bytes(&self) -> &[u8] {
        return self.value.as_bytes();
    }

    pub fn len(&self) -> usize {
        return self.value.len();
    }
}

pub struct SymbolTable {
    heap: Ptr<Heap>,
    table: RefCell<HashMap<String, SymbolPtr>>,
}

impl SymbolTable {
    pub fn new(heap: Ptr<Heap>) -> Self {
        return Self {
            heap,
            table: RefCell::new(HashMap::new()),
        };
    }

    pub fn get_or_insert(&self, content: &str) -> SymbolPtr {
        debug_assert!(self.heap.is_not_null());
        let mut table = self.table.borrow_mut();
        if let Some(symbol) = table.get(content) {
            return *symbol;
        }
        let symbol = self.heap.alloc(Symbol {
            value: content.to_string(),
        });
        table.insert(content.to_string(), symbol);
        return symbol;
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        return Self {
            heap: Ptr::null(),
            table: RefCell::new(HashMap::new()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_identity_interned() {
        crate::os::init();
        let heap = Heap::new();
        let table = SymbolTable::new(Ptr::from_ref(&heap));
        let a = table.get_or_insert("java/lang/Object");
        let b = table.get_or_insert("java/lang/Object");
        let c = table.get_or_insert("java/lang/String");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!("java/lang/Object", a.as_str());
        heap.destroy();
    }
}
