use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::object::class::JClassPtr;
use crate::thread::ThreadPtr;
use crate::vm::{VMConfig, VMPtr, VM};
use std::cell::Cell;

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory under the system temp dir, unique per test invocation.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "csvm-test-{}-{}-{}",
        std::process::id(),
        tag,
        SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    return dir;
}

pub fn write_class(dir: &Path, binary_name: &str, bytes: Vec<u8>) {
    let path = dir.join(format!("{}.class", binary_name));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

/// The handful of classes the launch driver preinitializes, as empty
/// synthesized class files. Tests that boot a VM point the JCL root here.
pub fn write_mini_jcl(dir: &Path) {
    write_class(
        dir,
        "java/lang/Object",
        ClassFileBuilder::new("java/lang/Object").no_super().build(),
    );
    for name in [
        "java/lang/String",
        "java/lang/Class",
        "java/lang/System",
        "java/lang/Thread",
    ] {
        write_class(dir, name, ClassFileBuilder::new(name).build());
    }
}

/// Boots a VM over the given JCL root and user classpath and hands it to
/// the test body.
pub fn run_in_vm<F: FnOnce(VMPtr, ThreadPtr)>(jcl_dir: &Path, user_class_path: &str, f: F) {
    let mut cfg = VMConfig::default();
    cfg.set_jcl_path(jcl_dir.to_str().unwrap());
    cfg.set_class_path(user_class_path);
    let mut vm = VM::new(&cfg);
    vm.init().unwrap();
    let thread = vm.thread_mgr().main_thread();
    f(vm, thread);
    vm.destroy();
}

/// Drives one `resolve_class` request to completion on the executor.
pub fn resolve_class_sync(thread: ThreadPtr, descriptor: &str) -> Option<JClassPtr> {
    let vm = thread.vm();
    let descriptor = vm.get_symbol(descriptor);
    let result = Rc::new(Cell::new(None));
    let result_cb = result.clone();
    vm.scheduler().run_until_finished(thread, || {
        vm.bootstrap_class_loader().resolve_class(
            thread,
            descriptor,
            Box::new(move |class| result_cb.set(class)),
        );
    });
    return result.get();
}

/// Drives one `initialize_class` request to completion on the executor.
pub fn initialize_class_sync(thread: ThreadPtr, descriptor: &str) -> Option<JClassPtr> {
    let vm = thread.vm();
    let descriptor = vm.get_symbol(descriptor);
    let result = Rc::new(Cell::new(None));
    let result_cb = result.clone();
    vm.scheduler().run_until_finished(thread, || {
        vm.bootstrap_class_loader().initialize_class(
            thread,
            descriptor,
            Box::new(move |class| result_cb.set(Some(class))),
            Box::new(|| {}),
        );
    });
    return result.get();
}

// ---------------------------------------------------------------------------
// Class file synthesis. Tests build real class bytes instead of shipping
// fixtures, so the parser sees the genuine format.
// ---------------------------------------------------------------------------

enum CpItem {
    Utf8(String),
    Class(u16),
    NameAndType(u16, u16),
    FieldRef(u16, u16),
}

pub struct CpBuilder {
    items: Vec<CpItem>,
    utf8_cache: HashMap<String, u16>,
    class_cache: HashMap<String, u16>,
}

impl CpBuilder {
    fn new() -> CpBuilder {
        return CpBuilder {
            items: Vec::new(),
            utf8_cache: HashMap::new(),
            class_cache: HashMap::new(),
        };
    }

    pub fn utf8(&mut self, content: &str) -> u16 {
        if let Some(index) = self.utf8_cache.get(content) {
            return *index;
        }
        self.items.push(CpItem::Utf8(content.to_string()));
        let index = self.items.len() as u16;
        self.utf8_cache.insert(content.to_string(), index);
        return index;
    }

    pub fn class(&mut self, binary_name: &str) -> u16 {
        if let Some(index) = self.class_cache.get(binary_name) {
            return *index;
        }
        let name_index = self.utf8(binary_name);
        self.items.push(CpItem::Class(name_index));
        let index = self.items.len() as u16;
        self.class_cache.insert(binary_name.to_string(), index);
        return index;
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.items.push(CpItem::NameAndType(name_index, descriptor_index));
        return self.items.len() as u16;
    }

    pub fn field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(class);
        let nat_index = self.name_and_type(name, descriptor);
        self.items.push(CpItem::FieldRef(class_index, nat_index));
        return self.items.len() as u16;
    }

    fn serialize(&self, out: &mut Vec<u8>) {
        w2(out, self.items.len() as u16 + 1);
        for item in &self.items {
            match item {
                CpItem::Utf8(content) => {
                    out.push(1);
                    w2(out, content.len() as u16);
                    out.extend_from_slice(content.as_bytes());
                }
                CpItem::Class(name_index) => {
                    out.push(7);
                    w2(out, *name_index);
                }
                CpItem::NameAndType(name_index, descriptor_index) => {
                    out.push(12);
                    w2(out, *name_index);
                    w2(out, *descriptor_index);
                }
                CpItem::FieldRef(class_index, nat_index) => {
                    out.push(9);
                    w2(out, *class_index);
                    w2(out, *nat_index);
                }
            }
        }
    }
}

pub struct FieldSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
}

impl FieldSpec {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> FieldSpec {
        return FieldSpec {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            signature: None,
        };
    }

    pub fn with_signature(mut self, signature: &str) -> FieldSpec {
        self.signature = Some(signature.to_string());
        return self;
    }
}

pub struct HandlerSpec {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// None is the catch-all handler.
    pub catch_class: Option<String>,
}

pub struct MethodSpec {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub code: Option<Vec<u8>>,
    pub max_stack: u16,
    pub max_locals: u16,
    pub exceptions: Vec<String>,
    pub handlers: Vec<HandlerSpec>,
    pub signature: Option<String>,
    pub raw_attrs: Vec<(String, Vec<u8>)>,
}

impl MethodSpec {
    pub fn new(access_flags: u16, name: &str, descriptor: &str) -> MethodSpec {
        return MethodSpec {
            access_flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            code: None,
            max_stack: 4,
            max_locals: 8,
            exceptions: Vec::new(),
            handlers: Vec::new(),
            signature: None,
            raw_attrs: Vec::new(),
        };
    }

    pub fn with_raw_attr(mut self, name: &str, bytes: Vec<u8>) -> MethodSpec {
        self.raw_attrs.push((name.to_string(), bytes));
        return self;
    }

    pub fn with_code(mut self, code: Vec<u8>) -> MethodSpec {
        self.code = Some(code);
        return self;
    }

    pub fn with_exceptions(mut self, exceptions: &[&str]) -> MethodSpec {
        self.exceptions = exceptions.iter().map(|e| e.to_string()).collect();
        return self;
    }

    pub fn with_handler(mut self, handler: HandlerSpec) -> MethodSpec {
        self.handlers.push(handler);
        return self;
    }

    pub fn with_signature(mut self, signature: &str) -> MethodSpec {
        self.signature = Some(signature.to_string());
        return self;
    }
}

pub struct ClassFileBuilder {
    pub cp: CpBuilder,
    name: String,
    super_name: Option<String>,
    access_flags: u16,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
}

enum BuiltAttr {
    Code {
        name_index: u16,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
        handlers: Vec<(u16, u16, u16, u16)>,
    },
    Exceptions {
        name_index: u16,
        class_indexes: Vec<u16>,
    },
    Signature {
        name_index: u16,
        sig_index: u16,
    },
    Raw {
        name_index: u16,
        bytes: Vec<u8>,
    },
}

struct BuiltMember {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attrs: Vec<BuiltAttr>,
}

impl ClassFileBuilder {
    pub fn new(name: &str) -> ClassFileBuilder {
        return ClassFileBuilder {
            cp: CpBuilder::new(),
            name: name.to_string(),
            super_name: Some("java/lang/Object".to_string()),
            access_flags: 0x0021, // ACC_PUBLIC | ACC_SUPER
            fields: Vec::new(),
            methods: Vec::new(),
        };
    }

    pub fn no_super(mut self) -> ClassFileBuilder {
        self.super_name = None;
        return self;
    }

    pub fn super_class(mut self, name: &str) -> ClassFileBuilder {
        self.super_name = Some(name.to_string());
        return self;
    }

    pub fn field(mut self, spec: FieldSpec) -> ClassFileBuilder {
        self.fields.push(spec);
        return self;
    }

    pub fn method(mut self, spec: MethodSpec) -> ClassFileBuilder {
        self.methods.push(spec);
        return self;
    }

    pub fn build(mut self) -> Vec<u8> {
        let this_index = self.cp.class(&self.name);
        let super_index = match &self.super_name {
            Some(super_name) => self.cp.class(super_name),
            None => 0,
        };

        let mut built_fields = Vec::new();
        for field in &self.fields {
            let name_index = self.cp.utf8(&field.name);
            let descriptor_index = self.cp.utf8(&field.descriptor);
            let mut attrs = Vec::new();
            if let Some(signature) = &field.signature {
                attrs.push(BuiltAttr::Signature {
                    name_index: self.cp.utf8("Signature"),
                    sig_index: self.cp.utf8(signature),
                });
            }
            built_fields.push(BuiltMember {
                access_flags: field.access_flags,
                name_index,
                descriptor_index,
                attrs,
            });
        }

        let mut built_methods = Vec::new();
        for method in &self.methods {
            let name_index = self.cp.utf8(&method.name);
            let descriptor_index = self.cp.utf8(&method.descriptor);
            let mut attrs = Vec::new();
            if let Some(code) = &method.code {
                let handlers = method
                    .handlers
                    .iter()
                    .map(|h| {
                        let catch_index = match &h.catch_class {
                            Some(catch_class) => self.cp.class(catch_class),
                            None => 0,
                        };
                        (h.start_pc, h.end_pc, h.handler_pc, catch_index)
                    })
                    .collect();
                attrs.push(BuiltAttr::Code {
                    name_index: self.cp.utf8("Code"),
                    max_stack: method.max_stack,
                    max_locals: method.max_locals,
                    code: code.clone(),
                    handlers,
                });
            }
            if !method.exceptions.is_empty() {
                let class_indexes = method
                    .exceptions
                    .iter()
                    .map(|e| self.cp.class(e))
                    .collect();
                attrs.push(BuiltAttr::Exceptions {
                    name_index: self.cp.utf8("Exceptions"),
                    class_indexes,
                });
            }
            if let Some(signature) = &method.signature {
                attrs.push(BuiltAttr::Signature {
                    name_index: self.cp.utf8("Signature"),
                    sig_index: self.cp.utf8(signature),
                });
            }
            for (name, bytes) in &method.raw_attrs {
                attrs.push(BuiltAttr::Raw {
                    name_index: self.cp.utf8(name),
                    bytes: bytes.clone(),
                });
            }
            built_methods.push(BuiltMember {
                access_flags: method.access_flags,
                name_index,
                descriptor_index,
                attrs,
            });
        }

        let mut out = Vec::new();
        w4(&mut out, 0xCAFEBABE);
        w2(&mut out, 0); // minor
        w2(&mut out, 52); // major: Java 8
        self.cp.serialize(&mut out);
        w2(&mut out, self.access_flags);
        w2(&mut out, this_index);
        w2(&mut out, super_index);
        w2(&mut out, 0); // interfaces
        w2(&mut out, built_fields.len() as u16);
        for field in &built_fields {
            serialize_member(&mut out, field);
        }
        w2(&mut out, built_methods.len() as u16);
        for method in &built_methods {
            serialize_member(&mut out, method);
        }
        w2(&mut out, 0); // class attributes
        return out;
    }
}

fn serialize_member(out: &mut Vec<u8>, member: &BuiltMember) {
    w2(out, member.access_flags);
    w2(out, member.name_index);
    w2(out, member.descriptor_index);
    w2(out, member.attrs.len() as u16);
    for attr in &member.attrs {
        match attr {
            BuiltAttr::Code {
                name_index,
                max_stack,
                max_locals,
                code,
                handlers,
            } => {
                w2(out, *name_index);
                w4(out, (12 + code.len() + 8 * handlers.len()) as u32);
                w2(out, *max_stack);
                w2(out, *max_locals);
                w4(out, code.len() as u32);
                out.extend_from_slice(code);
                w2(out, handlers.len() as u16);
                for (start_pc, end_pc, handler_pc, catch_index) in handlers {
                    w2(out, *start_pc);
                    w2(out, *end_pc);
                    w2(out, *handler_pc);
                    w2(out, *catch_index);
                }
                w2(out, 0); // code attributes
            }
            BuiltAttr::Exceptions {
                name_index,
                class_indexes,
            } => {
                w2(out, *name_index);
                w4(out, (2 + 2 * class_indexes.len()) as u32);
                w2(out, class_indexes.len() as u16);
                for class_index in class_indexes {
                    w2(out, *class_index);
                }
            }
            BuiltAttr::Signature {
                name_index,
                sig_index,
            } => {
                w2(out, *name_index);
                w4(out, 2);
                w2(out, *sig_index);
            }
            BuiltAttr::Raw { name_index, bytes } => {
                w2(out, *name_index);
                w4(out, bytes.len() as u32);
                out.extend_from_slice(bytes);
            }
        }
    }
}

fn w2(out: &mut Vec<u8>, val: u16) {
    out.extend_from_slice(&val.to_be_bytes());
}

fn w4(out: &mut Vec<u8>, val: u32) {
    out.extend_from_slice(&val.to_be_bytes());
}
