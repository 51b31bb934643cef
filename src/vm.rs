use std::cell::Cell;
use std::path::PathBuf;

use crate::classfile::class_loader::BootstrapClassLoader;
use crate::classfile::class_path::ClassPath;
use crate::memory::heap::Heap;
use crate::native::{NativeRegistry, TrappedMethods};
use crate::object::array::JArray;
use crate::object::method::NativeFn;
use crate::object::prelude::*;
use crate::object::string::StringTable;
use crate::object::symbol::SymbolTable;
use crate::object::JObject;
use crate::runtime::interpreter::Interpreter;
use crate::runtime::scheduler::Scheduler;
use crate::thread::{JThread, ThreadManager, ThreadPtr};
use crate::value::JValue;

pub type VMPtr = Ptr<VM>;

/// Classes the launch driver initializes before anything else runs.
const CORE_CLASSES: [&str; 5] = [
    "Ljava/lang/Object;",
    "Ljava/lang/String;",
    "Ljava/lang/Class;",
    "Ljava/lang/System;",
    "Ljava/lang/Thread;",
];

#[derive(Clone)]
pub struct VMConfig {
    jcl_path: String,
    class_path: String,
    main_class: String,
}

impl VMConfig {
    pub fn jcl_path(&self) -> &str {
        return &self.jcl_path;
    }

    pub fn set_jcl_path(&mut self, jcl_path: &str) {
        self.jcl_path = jcl_path.into();
    }

    pub fn class_path(&self) -> &str {
        return &self.class_path;
    }

    pub fn set_class_path(&mut self, class_path: &str) {
        self.class_path = class_path.into();
    }

    pub fn main_class(&self) -> &str {
        return &self.main_class;
    }

    pub fn set_main_class(&mut self, main_class: &str) {
        self.main_class = main_class.into();
    }

    fn get_csvm_home() -> Option<String> {
        if let Some(home) = std::env::var_os("csvm.home") {
            return home.into_string().ok();
        }
        return None;
    }

    fn get_exe_dir_path() -> Option<PathBuf> {
        match std::env::current_exe() {
            Ok(mut exe_path) => {
                exe_path.pop();
                return Some(exe_path);
            }
            Err(_) => None,
        }
    }

    fn default_jcl_path() -> String {
        let home = if let Some(home) = Self::get_csvm_home() {
            PathBuf::from(home)
        } else if let Some(exe_dir) = Self::get_exe_dir_path() {
            exe_dir
        } else {
            PathBuf::from(".")
        };
        return home.join("jcl").display().to_string();
    }
}

impl Default for VMConfig {
    fn default() -> Self {
        Self {
            jcl_path: Self::default_jcl_path(),
            class_path: ".".to_string(),
            main_class: "Main".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum VMError {
    InitError(String),
    RuntimeError(String),
}

pub struct VM {
    bootstrap_class_loader: BootstrapClassLoader,
    heap: Heap,
    class_path: ClassPath,
    scheduler: Scheduler,
    natives: NativeRegistry,
    trapped: TrappedMethods,
    symbol_table: SymbolTable,
    string_table: StringTable,
    thread_mgr: ThreadManager,
    cmdline_args: Cell<JArrayPtr>,
    system_initialized: Cell<bool>,
    cfg: VMConfig,
}

impl VM {
    pub fn new(cfg: &VMConfig) -> VMPtr {
        crate::os::init();
        let vm = Box::new(VM {
            bootstrap_class_loader: BootstrapClassLoader::default(),
            heap: Heap::new(),
            class_path: ClassPath::new(&cfg.jcl_path, &cfg.class_path),
            scheduler: Scheduler::new(),
            natives: NativeRegistry::new(),
            trapped: TrappedMethods::new(),
            symbol_table: SymbolTable::default(),
            string_table: StringTable::default(),
            thread_mgr: ThreadManager::new(),
            cmdline_args: Cell::new(JArrayPtr::null()),
            system_initialized: Cell::new(false),
            cfg: cfg.clone(),
        });
        return VMPtr::new(Box::into_raw(vm));
    }

    /// Wires the tables to the heap and attaches the calling host thread as
    /// the main logical thread.
    pub fn init(&mut self) -> Result<(), VMError> {
        let heap = Ptr::from_ref(&self.heap);
        self.symbol_table = SymbolTable::new(heap);
        self.string_table = StringTable::new(heap);
        let vm = VMPtr::from_ref(self);
        let thread = JThread::attach_current_thread(vm);
        self.bootstrap_class_loader.register_primitives(thread);
        return Ok(());
    }

    pub fn destroy(&self) {
        self.heap.destroy();
    }

    pub fn as_ptr(&self) -> VMPtr {
        return VMPtr::from_ref(self);
    }

    pub fn heap(&self) -> &Heap {
        return &self.heap;
    }

    pub fn scheduler(&self) -> &Scheduler {
        return &self.scheduler;
    }

    pub fn bootstrap_class_loader(&self) -> &BootstrapClassLoader {
        return &self.bootstrap_class_loader;
    }

    pub fn class_path(&self) -> &ClassPath {
        return &self.class_path;
    }

    pub fn thread_mgr(&self) -> &ThreadManager {
        return &self.thread_mgr;
    }

    pub fn cfg(&self) -> &VMConfig {
        return &self.cfg;
    }

    pub fn get_symbol(&self, content: &str) -> SymbolPtr {
        return self.symbol_table.get_or_insert(content);
    }

    pub fn intern_string(&self, content: &str) -> JStringPtr {
        return self.string_table.intern(content);
    }

    pub fn create_string(&self, content: &str) -> JStringPtr {
        return self.string_table.create(content);
    }

    pub(crate) fn get_native(&self, owner: &str, name_desc: &str) -> Option<NativeFn> {
        return self.natives.get(owner, name_desc);
    }

    pub(crate) fn trapped_methods(&self) -> &TrappedMethods {
        return &self.trapped;
    }

    pub fn system_initialized(&self) -> bool {
        return self.system_initialized.get();
    }

    pub fn cmdline_args(&self) -> JArrayPtr {
        return self.cmdline_args.get();
    }

    /// Publishes the command-line strings as a `java/lang/String[]` for
    /// `main`.
    pub fn set_cmdline_args(&self, thread: ThreadPtr, args: &[String]) {
        let mut arr = JArray::new(
            self.get_symbol("Ljava/lang/String;"),
            args.len() as JInt,
            thread,
        );
        for (index, arg) in args.iter().enumerate() {
            arr.set(index as JInt, JValue::with_str_val(self.create_string(arg)));
        }
        self.cmdline_args.set(arr);
    }

    /// Initializes the core classes in order, cooperatively. Exactly one of
    /// the continuations fires.
    pub fn preinitialize_core_classes(
        &self,
        thread: ThreadPtr,
        ok: Box<dyn FnOnce()>,
        fail: Box<dyn FnOnce()>,
    ) {
        Self::preinitialize_next(thread, 0, ok, fail);
    }

    fn preinitialize_next(
        thread: ThreadPtr,
        index: usize,
        ok: Box<dyn FnOnce()>,
        fail: Box<dyn FnOnce()>,
    ) {
        if index >= CORE_CLASSES.len() {
            ok();
            return;
        }
        let descriptor = thread.vm().get_symbol(CORE_CLASSES[index]);
        let (fail_here, fail_later) = crate::runtime::scheduler::share_once(fail);
        thread.vm().bootstrap_class_loader().initialize_class(
            thread,
            descriptor,
            Box::new(move |_class| {
                Self::preinitialize_next(thread, index + 1, ok, fail_later)
            }),
            fail_here,
        );
    }

    /// Builds the `java/lang/Thread` object the main logical thread is
    /// mirrored by. Failure has already been surfaced on the thread.
    pub fn init_threads(&self, thread: ThreadPtr, done: Box<dyn FnOnce(bool)>) {
        let thread_cls = self
            .bootstrap_class_loader
            .find_loaded_by_name("java/lang/Thread", thread);
        if thread_cls.is_null() {
            thread.throw_new_exception("java/lang/InternalError", "java/lang/Thread not loaded");
            done(false);
            return;
        }
        let thread_obj = JObject::new(thread_cls, thread);
        thread.set_j_thread_obj(thread_obj);
        log::debug!("main thread object created");
        done(true);
    }

    /// Runs `System.initializeSystemClass()V` once, when the class library
    /// provides it.
    pub fn init_system_class(&self, thread: ThreadPtr, done: Box<dyn FnOnce(bool)>) {
        if self.system_initialized.get() {
            done(true);
            return;
        }
        let vm = VMPtr::from_ref(self);
        let system_cls = self
            .bootstrap_class_loader
            .find_loaded_by_name("java/lang/System", thread);
        if system_cls.is_null() {
            thread.throw_new_exception("java/lang/InternalError", "java/lang/System not loaded");
            done(false);
            return;
        }
        let init_method = system_cls.find_self_method(
            self.get_symbol("initializeSystemClass"),
            self.get_symbol("()V"),
        );
        match init_method {
            None => {
                vm.system_initialized.set(true);
                done(true);
            }
            Some(init_method) => {
                Interpreter::invoke(
                    thread,
                    init_method,
                    Vec::new(),
                    Box::new(move |_ret| {
                        if thread.has_pending_exception() {
                            done(false);
                        } else {
                            vm.system_initialized.set(true);
                            done(true);
                        }
                    }),
                );
            }
        }
    }
}

unsafe impl Send for VM {}
unsafe impl Send for VMPtr {}
