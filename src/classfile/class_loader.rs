use std::cell::RefCell;
use std::collections::HashMap;

use super::class_path::ClassPathError;
use super::parser::ClassParser;
use super::reader::OwnedBytesClassReader;
use crate::object::class::{ClassState, JClass, JClassPtr};
use crate::object::prelude::*;
use crate::thread::ThreadPtr;

pub type BootstrapClassLoaderPtr = Ptr<BootstrapClassLoader>;

/// The bootstrap loader: the only loader this runtime has. Classes are
/// keyed by binary name (`java/lang/Object`), primitives by their
/// descriptor character, arrays by their full descriptor.
pub struct BootstrapClassLoader {
    classes: RefCell<HashMap<SymbolPtr, JClassPtr>>,
}

impl BootstrapClassLoader {
    pub fn new() -> BootstrapClassLoader {
        return BootstrapClassLoader {
            classes: RefCell::new(HashMap::new()),
        };
    }

    /// Primitive classes exist from the start; there is nothing to load.
    pub fn register_primitives(&self, thread: ThreadPtr) {
        let vm = thread.vm();
        for descriptor in ["B", "S", "C", "I", "J", "F", "D", "Z", "V"] {
            let name = vm.get_symbol(descriptor);
            let class = JClass::new_primitive(name, vm.as_ref());
            self.classes.borrow_mut().insert(name, class);
        }
    }

    fn find_loaded(&self, key: SymbolPtr) -> JClassPtr {
        return self
            .classes
            .borrow()
            .get(&key)
            .copied()
            .unwrap_or(JClassPtr::null());
    }

    pub fn find_loaded_by_name(&self, binary_name: &str, thread: ThreadPtr) -> JClassPtr {
        return self.find_loaded(thread.vm().get_symbol(binary_name));
    }

    /// Map key for a descriptor: `Ljava/lang/Object;` -> `java/lang/Object`;
    /// primitives and arrays key by the descriptor itself.
    fn key_for(&self, thread: ThreadPtr, descriptor: SymbolPtr) -> SymbolPtr {
        let text = descriptor.as_str();
        if text.starts_with('L') && text.ends_with(';') {
            return thread.vm().get_symbol(&text[1..text.len() - 1]);
        }
        return descriptor;
    }

    /// Asynchronously resolves one class by descriptor: loads it (and its
    /// superclass chain) if needed. The callback receives `None` on failure,
    /// with the Java exception left on the thread.
    pub fn resolve_class(
        &self,
        thread: ThreadPtr,
        descriptor: SymbolPtr,
        cb: Box<dyn FnOnce(Option<JClassPtr>)>,
    ) {
        let this = BootstrapClassLoaderPtr::from_ref(self);
        thread.vm().scheduler().schedule(Box::new(move || {
            cb(this.resolve_sync(thread, descriptor));
        }));
    }

    /// Batched resolution with single success/failure semantics: either
    /// every descriptor resolves and the callback gets the full map, or the
    /// callback gets `None` and the first failure's exception stays on the
    /// thread.
    pub fn resolve_classes(
        &self,
        thread: ThreadPtr,
        descriptors: Vec<SymbolPtr>,
        cb: Box<dyn FnOnce(Option<HashMap<SymbolPtr, JClassPtr>>)>,
    ) {
        let this = BootstrapClassLoaderPtr::from_ref(self);
        thread.vm().scheduler().schedule(Box::new(move || {
            let mut resolved = HashMap::with_capacity(descriptors.len());
            let mut failed = false;
            for descriptor in descriptors {
                match this.resolve_sync(thread, descriptor) {
                    Some(class) => {
                        resolved.insert(descriptor, class);
                    }
                    None => {
                        failed = true;
                        break;
                    }
                }
            }
            if failed {
                cb(None);
            } else {
                cb(Some(resolved));
            }
        }));
    }

    /// Asynchronously resolves and then initializes a class; `ok` receives
    /// the initialized class.
    pub fn initialize_class(
        &self,
        thread: ThreadPtr,
        descriptor: SymbolPtr,
        ok: Box<dyn FnOnce(JClassPtr)>,
        fail: Box<dyn FnOnce()>,
    ) {
        let this = BootstrapClassLoaderPtr::from_ref(self);
        thread.vm().scheduler().schedule(Box::new(move || {
            let class = match this.resolve_sync(thread, descriptor) {
                Some(class) => class,
                None => {
                    fail();
                    return;
                }
            };
            class.initialize(thread, Box::new(move || ok(class)), fail);
        }));
    }

    /// Synchronous fetch, only answers classes that finished initialization.
    pub fn get_initialized_class(&self, thread: ThreadPtr, descriptor: &str) -> JClassPtr {
        let descriptor = thread.vm().get_symbol(descriptor);
        let class = self.find_loaded(self.key_for(thread, descriptor));
        if class.is_not_null() && class.state() == ClassState::Initialized {
            return class;
        }
        return JClassPtr::null();
    }

    fn resolve_sync(&self, thread: ThreadPtr, descriptor: SymbolPtr) -> Option<JClassPtr> {
        let key = self.key_for(thread, descriptor);
        let existing = self.find_loaded(key);
        if existing.is_not_null() {
            return Some(existing);
        }
        if descriptor.as_str().starts_with('[') {
            return self.load_array_class(thread, descriptor);
        }
        return self.load_class(thread, key);
    }

    fn load_array_class(&self, thread: ThreadPtr, descriptor: SymbolPtr) -> Option<JClassPtr> {
        let vm = thread.vm();
        let component_descriptor = vm.get_symbol(&descriptor.as_str()[1..]);
        let component = self.resolve_sync(thread, component_descriptor)?;
        let class = JClass::new_array(descriptor, component, vm.as_ref());
        self.classes.borrow_mut().insert(descriptor, class);
        return Some(class);
    }

    /// Loads, parses, and links one instance class by binary name. The
    /// class is registered before its superclass resolves so that cycles
    /// through the constant pool terminate.
    fn load_class(&self, thread: ThreadPtr, binary_name: SymbolPtr) -> Option<JClassPtr> {
        let vm = thread.vm();
        log::debug!("loading class {}", binary_name.as_str());
        let mut loaded_bytes: Option<Vec<u8>> = None;
        let mut load_failure: Option<ClassPathError> = None;
        vm.class_path().read_class(
            binary_name.as_str(),
            |bytes| loaded_bytes = Some(bytes),
            |err| load_failure = Some(err),
        );
        let bytes = match loaded_bytes {
            Some(bytes) => bytes,
            None => {
                match load_failure {
                    Some(ClassPathError::NotFound(name)) => {
                        thread.throw_new_exception("java/lang/NoClassDefFoundError", &name);
                    }
                    Some(ClassPathError::Io(file, err)) => {
                        thread.throw_new_exception(
                            "java/lang/NoClassDefFoundError",
                            &format!("error reading {}: {}", file, err),
                        );
                    }
                    None => unreachable!("read_class invokes exactly one callback"),
                }
                return None;
            }
        };
        let reader = Box::new(OwnedBytesClassReader::new(bytes));
        let class = match ClassParser::new(reader, vm.as_ref()).parse_class() {
            Ok(class) => class,
            Err(err) => {
                thread.throw_new_exception(
                    "java/lang/ClassFormatError",
                    &format!("{}: {:?}", binary_name.as_str(), err),
                );
                return None;
            }
        };
        if class.name() != binary_name {
            thread.throw_new_exception(
                "java/lang/NoClassDefFoundError",
                &format!(
                    "{} (wrong name: {})",
                    binary_name.as_str(),
                    class.name().as_str()
                ),
            );
            return None;
        }
        self.classes.borrow_mut().insert(binary_name, class);
        let super_class = if class.super_name().is_not_null() {
            match self.load_or_find(thread, class.super_name()) {
                Some(super_class) => super_class,
                None => return None,
            }
        } else {
            JClassPtr::null()
        };
        for interface_index in 0..class.interfaces().len() {
            let interface_name = class.interfaces()[interface_index];
            self.load_or_find(thread, interface_name)?;
        }
        class.link(super_class);
        return Some(class);
    }

    fn load_or_find(&self, thread: ThreadPtr, binary_name: SymbolPtr) -> Option<JClassPtr> {
        let existing = self.find_loaded(binary_name);
        if existing.is_not_null() {
            return Some(existing);
        }
        return self.load_class(thread, binary_name);
    }
}

impl Default for BootstrapClassLoader {
    fn default() -> Self {
        return Self::new();
    }
}
