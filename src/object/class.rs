use std::cell::{Cell, RefCell};

use crate::object::constant_pool::ConstantPoolPtr;
use crate::object::field::FieldPtr;
use crate::object::method::MethodPtr;
use crate::object::prelude::*;
use crate::object::{JObject, Monitor, MonitorPtr, ObjectPtr};
use crate::runtime::interpreter::Interpreter;
use crate::thread::ThreadPtr;
use crate::value::JValue;
use crate::vm::VM;

pub type JClassPtr = Ptr<JClass>;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClassState {
    Loaded,
    Resolved,
    Initializing,
    Initialized,
    Failed,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ClassKind {
    Instance,
    Array,
    Primitive,
}

/// Runtime representation of one loaded class. Member slots are assigned
/// here, exactly once, when the loader resolves the class.
pub struct JClass {
    name: SymbolPtr,
    kind: ClassKind,
    access_flags: u16,
    super_name: SymbolPtr,
    super_class: Cell<JClassPtr>,
    interfaces: Vec<SymbolPtr>,
    cp: ConstantPoolPtr,
    fields: Vec<FieldPtr>,
    methods: Vec<MethodPtr>,
    statics: RefCell<Vec<JValue>>,
    instance_slot_count: Cell<usize>,
    state: Cell<ClassState>,
    class_object: Cell<ObjectPtr>,
    component: JClassPtr,
    monitor: Monitor,
}

impl JClass {
    pub fn new(
        name: SymbolPtr,
        access_flags: u16,
        super_name: SymbolPtr,
        interfaces: Vec<SymbolPtr>,
        cp: ConstantPoolPtr,
        fields: Vec<FieldPtr>,
        methods: Vec<MethodPtr>,
        vm: &VM,
    ) -> JClassPtr {
        let class = vm.heap().alloc(JClass {
            name,
            kind: ClassKind::Instance,
            access_flags,
            super_name,
            super_class: Cell::new(JClassPtr::null()),
            interfaces,
            cp,
            fields,
            methods,
            statics: RefCell::new(Vec::new()),
            instance_slot_count: Cell::new(0),
            state: Cell::new(ClassState::Loaded),
            class_object: Cell::new(ObjectPtr::null()),
            component: JClassPtr::null(),
            monitor: Monitor::new(),
        });
        for field in &class.fields {
            let mut field = *field;
            field.set_owner(class);
        }
        for method in &class.methods {
            let mut method = *method;
            method.set_owner(class);
        }
        return class;
    }

    pub fn new_array(name: SymbolPtr, component: JClassPtr, vm: &VM) -> JClassPtr {
        return vm.heap().alloc(JClass {
            name,
            kind: ClassKind::Array,
            access_flags: ClassAccessFlags::AccPublic as u16 | ClassAccessFlags::AccFinal as u16,
            super_name: SymbolPtr::null(),
            super_class: Cell::new(JClassPtr::null()),
            interfaces: Vec::new(),
            cp: ConstantPoolPtr::null(),
            fields: Vec::new(),
            methods: Vec::new(),
            statics: RefCell::new(Vec::new()),
            instance_slot_count: Cell::new(0),
            state: Cell::new(ClassState::Initialized),
            class_object: Cell::new(ObjectPtr::null()),
            component,
            monitor: Monitor::new(),
        });
    }

    pub fn new_primitive(name: SymbolPtr, vm: &VM) -> JClassPtr {
        return vm.heap().alloc(JClass {
            name,
            kind: ClassKind::Primitive,
            access_flags: ClassAccessFlags::AccPublic as u16 | ClassAccessFlags::AccFinal as u16,
            super_name: SymbolPtr::null(),
            super_class: Cell::new(JClassPtr::null()),
            interfaces: Vec::new(),
            cp: ConstantPoolPtr::null(),
            fields: Vec::new(),
            methods: Vec::new(),
            statics: RefCell::new(Vec::new()),
            instance_slot_count: Cell::new(0),
            state: Cell::new(ClassState::Initialized),
            class_object: Cell::new(ObjectPtr::null()),
            component: JClassPtr::null(),
            monitor: Monitor::new(),
        });
    }

    pub fn name(&self) -> SymbolPtr {
        return self.name;
    }

    pub fn access_flags(&self) -> u16 {
        return self.access_flags;
    }

    pub fn super_name(&self) -> SymbolPtr {
        return self.super_name;
    }

    pub fn super_class(&self) -> JClassPtr {
        return self.super_class.get();
    }

    pub fn interfaces(&self) -> &[SymbolPtr] {
        return &self.interfaces;
    }

    pub fn constant_pool(&self) -> ConstantPoolPtr {
        return self.cp;
    }

    pub fn fields(&self) -> &[FieldPtr] {
        return &self.fields;
    }

    pub fn methods(&self) -> &[MethodPtr] {
        return &self.methods;
    }

    pub fn component(&self) -> JClassPtr {
        return self.component;
    }

    pub fn is_array(&self) -> bool {
        return self.kind == ClassKind::Array;
    }

    pub fn is_primitive(&self) -> bool {
        return self.kind == ClassKind::Primitive;
    }

    pub fn is_interface(&self) -> bool {
        return ClassAccessFlags::is_interface(self.access_flags);
    }

    pub fn state(&self) -> ClassState {
        return self.state.get();
    }

    pub fn instance_slot_count(&self) -> usize {
        return self.instance_slot_count.get();
    }

    pub fn monitor(&self) -> MonitorPtr {
        return MonitorPtr::from_ref(&self.monitor);
    }

    /// Links the class once its superclass is resolved: assigns every member
    /// its table slot and sizes the static storage. Runs exactly once.
    pub fn link(&self, super_class: JClassPtr) {
        debug_assert!(self.state.get() == ClassState::Loaded);
        self.super_class.set(super_class);
        let mut static_slot = 0;
        let mut instance_slot = if super_class.is_not_null() {
            super_class.instance_slot_count() as JInt
        } else {
            0
        };
        for field in &self.fields {
            let mut field = *field;
            if field.is_static() {
                field.set_slot(static_slot);
                static_slot += 1;
            } else {
                field.set_slot(instance_slot);
                instance_slot += 1;
            }
        }
        for (index, method) in self.methods.iter().enumerate() {
            let mut method = *method;
            method.set_slot(index as JInt);
        }
        self.instance_slot_count.set(instance_slot as usize);
        let mut statics = self.statics.borrow_mut();
        statics.resize_with(static_slot as usize, JValue::default);
        self.state.set(ClassState::Resolved);
        log::trace!(
            "linked {}: {} static slots, {} instance slots",
            self.name.as_str(),
            static_slot,
            instance_slot
        );
    }

    /// Finds a field by name on this class or a superclass.
    pub fn find_field(&self, name: SymbolPtr) -> Option<FieldPtr> {
        for field in &self.fields {
            if field.name() == name {
                return Some(*field);
            }
        }
        let super_class = self.super_class.get();
        if super_class.is_not_null() {
            return super_class.find_field(name);
        }
        return None;
    }

    /// Finds a method declared on this class itself.
    pub fn find_self_method(&self, name: SymbolPtr, descriptor: SymbolPtr) -> Option<MethodPtr> {
        for method in &self.methods {
            if method.name() == name && method.descriptor() == descriptor {
                return Some(*method);
            }
        }
        return None;
    }

    /// Finds a method on this class or a superclass.
    pub fn find_method(&self, name: SymbolPtr, descriptor: SymbolPtr) -> Option<MethodPtr> {
        if let Some(method) = self.find_self_method(name, descriptor) {
            return Some(method);
        }
        let super_class = self.super_class.get();
        if super_class.is_not_null() {
            return super_class.find_method(name, descriptor);
        }
        return None;
    }

    pub fn static_get(&self, field: FieldPtr) -> JValue {
        debug_assert!(field.is_static());
        debug_assert!(field.owner() == JClassPtr::from_ref(self));
        return self.statics.borrow()[field.slot() as usize];
    }

    pub fn static_set(&self, field: FieldPtr, val: JValue) {
        debug_assert!(field.is_static());
        debug_assert!(field.owner() == JClassPtr::from_ref(self));
        self.statics.borrow_mut()[field.slot() as usize] = val;
    }

    /// Lazily builds the `java/lang/Class` mirror for this class. The mirror
    /// carries the monitor used by synchronized static methods.
    pub fn get_class_object(&self, thread: ThreadPtr) -> ObjectPtr {
        let existing = self.class_object.get();
        if existing.is_not_null() {
            return existing;
        }
        let jclass_cls = thread
            .vm()
            .bootstrap_class_loader()
            .find_loaded_by_name("java/lang/Class", thread);
        let mirror = JObject::new(jclass_cls, thread);
        self.class_object.set(mirror);
        return mirror;
    }

    fn clinit_method(&self, thread: ThreadPtr) -> Option<MethodPtr> {
        let vm = thread.vm();
        return self.find_self_method(vm.get_symbol("<clinit>"), vm.get_symbol("()V"));
    }

    /// Cooperative class initialization. Runs the superclass chain and then
    /// this class's `<clinit>` through the interpreter; exactly one of the
    /// continuations fires. A recursive request during `Initializing`
    /// resumes immediately, per the JVM's reentrant initialization rule.
    pub fn initialize(&self, thread: ThreadPtr, ok: Box<dyn FnOnce()>, fail: Box<dyn FnOnce()>) {
        let this = JClassPtr::from_ref(self);
        match self.state.get() {
            ClassState::Initialized | ClassState::Initializing => {
                ok();
                return;
            }
            ClassState::Failed => {
                thread.throw_new_exception(
                    "java/lang/NoClassDefFoundError",
                    self.name.as_str(),
                );
                fail();
                return;
            }
            ClassState::Loaded => {
                debug_assert!(false, "initialize() before link()");
                fail();
                return;
            }
            ClassState::Resolved => {}
        }
        self.state.set(ClassState::Initializing);
        let super_class = self.super_class.get();
        if super_class.is_not_null() && super_class.state() != ClassState::Initialized {
            let (fail_after_super, fail_in_super) = crate::runtime::scheduler::share_once(fail);
            super_class.initialize(
                thread,
                Box::new(move || this.run_clinit(thread, ok, fail_after_super)),
                Box::new(move || {
                    this.state.set(ClassState::Failed);
                    fail_in_super();
                }),
            );
            return;
        }
        self.run_clinit(thread, ok, fail);
    }

    fn run_clinit(&self, thread: ThreadPtr, ok: Box<dyn FnOnce()>, fail: Box<dyn FnOnce()>) {
        let this = JClassPtr::from_ref(self);
        let clinit = match self.clinit_method(thread) {
            None => {
                self.state.set(ClassState::Initialized);
                ok();
                return;
            }
            Some(clinit) => clinit,
        };
        log::debug!("running <clinit> of {}", self.name.as_str());
        Interpreter::invoke(
            thread,
            clinit,
            Vec::new(),
            Box::new(move |_ret| {
                if thread.has_pending_exception() {
                    this.state.set(ClassState::Failed);
                    fail();
                } else {
                    this.state.set(ClassState::Initialized);
                    ok();
                }
            }),
        );
    }
}

#[allow(unused)]
pub enum ClassAccessFlags {
    AccPublic = 0x0001,
    AccFinal = 0x0010,
    AccSuper = 0x0020,
    AccInterface = 0x0200,
    AccAbstract = 0x0400,
    AccSynthetic = 0x1000,
    AccAnnotation = 0x2000,
    AccEnum = 0x4000,
}

impl ClassAccessFlags {
    pub fn is_interface(access_flags: u16) -> bool {
        return access_flags & ClassAccessFlags::AccInterface as u16 != 0;
    }
}
