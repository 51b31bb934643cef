use crate::classfile::attributes::Attribute;
use crate::classfile::descriptor::binary_name_to_descriptor;
use crate::object::array::JArray;
use crate::object::field::{Field, FieldPtr};
use crate::object::method::{Method, MethodCode, MethodPtr};
use crate::object::prelude::*;
use crate::thread::ThreadPtr;

/// `java/lang/reflect/Field` as the core builds it.
pub struct FieldMirror {
    pub clazz: JClassPtr,
    pub name: JStringPtr,
    pub type_cls: JClassPtr,
    pub modifiers: u16,
    pub slot: JInt,
    /// Generic signature text, null when the field has none.
    pub signature: JStringPtr,
    /// Raw annotation bytes, null when absent.
    pub annotations: JArrayPtr,
}

pub type FieldMirrorPtr = Ptr<FieldMirror>;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MirrorKind {
    Method,
    Constructor,
}

/// `java/lang/reflect/Method` or `Constructor`, by `kind`.
pub struct MethodMirror {
    pub kind: MirrorKind,
    pub clazz: JClassPtr,
    pub name: JStringPtr,
    pub parameter_types: Vec<JClassPtr>,
    pub return_type: JClassPtr,
    pub exception_types: Vec<JClassPtr>,
    pub modifiers: u16,
    pub slot: JInt,
    pub signature: JStringPtr,
    pub annotations: JArrayPtr,
    pub annotation_default: JArrayPtr,
    pub parameter_annotations: JArrayPtr,
}

pub type MethodMirrorPtr = Ptr<MethodMirror>;

impl Field {
    /// Builds the reflection mirror, first resolving the declared type
    /// through the owning loader (which may suspend). The callback receives
    /// `None` when resolution fails.
    pub fn reflect(&self, thread: ThreadPtr, cb: Box<dyn FnOnce(Option<FieldMirrorPtr>)>) {
        let this = FieldPtr::from_ref(self);
        thread.vm().bootstrap_class_loader().resolve_class(
            thread,
            self.descriptor(),
            Box::new(move |resolved| {
                let type_cls = match resolved {
                    Some(type_cls) => type_cls,
                    None => {
                        cb(None);
                        return;
                    }
                };
                let vm = thread.vm();
                let signature = match this.get_attribute("Signature") {
                    Some(Attribute::Signature { sig }) => vm.intern_string(sig.as_str()),
                    _ => JStringPtr::null(),
                };
                let annotations = match this.get_attribute("RuntimeVisibleAnnotations") {
                    Some(Attribute::RuntimeVisibleAnnotations { raw_bytes, .. }) => {
                        JArray::from_bytes(raw_bytes, thread)
                    }
                    _ => JArrayPtr::null(),
                };
                let mirror = vm.heap().alloc(FieldMirror {
                    clazz: this.owner(),
                    name: vm.intern_string(this.name().as_str()),
                    type_cls,
                    modifiers: this.raw_flags(),
                    slot: this.slot(),
                    signature,
                    annotations,
                });
                cb(Some(mirror));
            }),
        );
    }
}

impl Method {
    /// The descriptors a reflection mirror needs resolved: return type,
    /// parameter types, declared checked exceptions, and, when bytecode has
    /// exception handlers, `Ljava/lang/Throwable;` plus every non-wildcard
    /// catch type. Deduplicated, order preserved.
    pub fn reflect_descriptors(&self, thread: ThreadPtr) -> Vec<SymbolPtr> {
        let vm = thread.vm();
        let mut descriptors = Vec::new();
        let mut push = |descriptors: &mut Vec<SymbolPtr>, desc: SymbolPtr| {
            if !descriptors.contains(&desc) {
                descriptors.push(desc);
            }
        };
        push(&mut descriptors, self.return_type());
        for param_type in self.param_types() {
            push(&mut descriptors, *param_type);
        }
        for exception in self.declared_exceptions() {
            push(
                &mut descriptors,
                vm.get_symbol(&binary_name_to_descriptor(exception.as_str())),
            );
        }
        if let MethodCode::Bytecode(_) = self.code() {
            let code = self.code_attribute();
            if !code.exception_handlers.is_empty() {
                push(&mut descriptors, vm.get_symbol("Ljava/lang/Throwable;"));
                for handler in &code.exception_handlers {
                    if handler.catch_class.is_not_null() {
                        push(
                            &mut descriptors,
                            vm.get_symbol(&binary_name_to_descriptor(
                                handler.catch_class.as_str(),
                            )),
                        );
                    }
                }
            }
        }
        return descriptors;
    }

    fn declared_exceptions(&self) -> Vec<SymbolPtr> {
        match self.get_attribute("Exceptions") {
            Some(Attribute::Exceptions { exceptions }) => exceptions.clone(),
            _ => Vec::new(),
        }
    }

    /// Builds the `Method` (or `Constructor`) mirror after resolving the
    /// whole descriptor closure in one batched call. On batch failure the
    /// callback receives `None` and the surfaced exception stays on the
    /// thread.
    pub fn reflect(
        &self,
        thread: ThreadPtr,
        is_constructor: bool,
        cb: Box<dyn FnOnce(Option<MethodMirrorPtr>)>,
    ) {
        let this = MethodPtr::from_ref(self);
        let descriptors = self.reflect_descriptors(thread);
        thread.vm().bootstrap_class_loader().resolve_classes(
            thread,
            descriptors,
            Box::new(move |resolved| {
                let classes = match resolved {
                    Some(classes) => classes,
                    None => {
                        cb(None);
                        return;
                    }
                };
                let vm = thread.vm();
                let parameter_types = this
                    .param_types()
                    .iter()
                    .map(|desc| classes[desc])
                    .collect();
                let return_type = classes[&this.return_type()];
                let exception_types = this
                    .declared_exceptions()
                    .iter()
                    .map(|name| {
                        classes[&vm.get_symbol(&binary_name_to_descriptor(name.as_str()))]
                    })
                    .collect();
                let signature = match this.get_attribute("Signature") {
                    Some(Attribute::Signature { sig }) => vm.intern_string(sig.as_str()),
                    _ => JStringPtr::null(),
                };
                let annotations = match this.get_attribute("RuntimeVisibleAnnotations") {
                    Some(Attribute::RuntimeVisibleAnnotations { raw_bytes, .. }) => {
                        JArray::from_bytes(raw_bytes, thread)
                    }
                    _ => JArrayPtr::null(),
                };
                let annotation_default = match this.get_attribute("AnnotationDefault") {
                    Some(Attribute::AnnotationDefault { raw_bytes }) => {
                        JArray::from_bytes(raw_bytes, thread)
                    }
                    _ => JArrayPtr::null(),
                };
                let parameter_annotations =
                    match this.get_attribute("RuntimeVisibleParameterAnnotations") {
                        Some(Attribute::RuntimeVisibleParameterAnnotations { raw_bytes }) => {
                            JArray::from_bytes(raw_bytes, thread)
                        }
                        _ => JArrayPtr::null(),
                    };
                let mirror = vm.heap().alloc(MethodMirror {
                    kind: if is_constructor {
                        MirrorKind::Constructor
                    } else {
                        MirrorKind::Method
                    },
                    clazz: this.owner(),
                    name: vm.intern_string(this.name().as_str()),
                    parameter_types,
                    return_type,
                    exception_types,
                    modifiers: this.raw_flags(),
                    slot: this.slot(),
                    signature,
                    annotations,
                    annotation_default,
                    parameter_annotations,
                });
                cb(Some(mirror));
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{
        resolve_class_sync, run_in_vm, scratch_dir, write_class, write_mini_jcl,
        ClassFileBuilder, FieldSpec, HandlerSpec, MethodSpec,
    };
    use std::cell::Cell;
    use std::rc::Rc;

    const ACC_PUBLIC: u16 = 0x0001;
    const ACC_STATIC: u16 = 0x0008;

    fn reflect_classes() -> Vec<(&'static str, Vec<u8>)> {
        let mut classes = vec![(
            "t/Refl",
            ClassFileBuilder::new("t/Refl")
                .field(
                    FieldSpec::new(ACC_PUBLIC, "label", "Ljava/lang/String;")
                        .with_signature("TT;"),
                )
                .field(FieldSpec::new(ACC_PUBLIC, "broken", "Lt/Missing;"))
                .method(
                    MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "work", "(ILjava/lang/String;)[D")
                        .with_code(vec![0x01, 0xb0])
                        .with_exceptions(&[
                            "java/io/IOException",
                            "java/lang/IllegalStateException",
                        ])
                        .with_handler(HandlerSpec {
                            start_pc: 0,
                            end_pc: 1,
                            handler_pc: 1,
                            catch_class: Some("java/lang/RuntimeException".to_string()),
                        })
                        .with_handler(HandlerSpec {
                            start_pc: 0,
                            end_pc: 1,
                            handler_pc: 1,
                            catch_class: None,
                        }),
                )
                .method(
                    MethodSpec::new(ACC_PUBLIC, "<init>", "()V").with_code(vec![0xb1]),
                )
                .method(MethodSpec::new(
                    ACC_PUBLIC | ACC_STATIC,
                    "broken",
                    "(Lt/Missing;)V",
                ).with_code(vec![0xb1]))
                .build(),
        )];
        for name in [
            "java/lang/Throwable",
            "java/lang/RuntimeException",
            "java/lang/IllegalStateException",
            "java/io/IOException",
        ] {
            classes.push((name, ClassFileBuilder::new(name).build()));
        }
        return classes;
    }

    fn with_reflect_classes<F: FnOnce(crate::vm::VMPtr, crate::thread::ThreadPtr)>(f: F) {
        let jcl = scratch_dir("refl_jcl");
        write_mini_jcl(&jcl);
        let user_cp = scratch_dir("refl_cp");
        for (name, bytes) in reflect_classes() {
            write_class(&user_cp, name, bytes);
        }
        run_in_vm(&jcl, user_cp.to_str().unwrap(), f);
    }

    #[test]
    fn method_resolution_closure_covers_return_params_exceptions_and_handlers() {
        with_reflect_classes(|vm, thread| {
            let class = resolve_class_sync(thread, "Lt/Refl;").unwrap();
            let work = class
                .find_self_method(vm.get_symbol("work"), vm.get_symbol("(ILjava/lang/String;)[D"))
                .unwrap();
            let resolved = work.reflect_descriptors(thread);
            let descriptors: Vec<&str> = resolved.iter().map(|d| d.as_str()).collect();
            assert_eq!(
                vec![
                    "[D",
                    "I",
                    "Ljava/lang/String;",
                    "Ljava/io/IOException;",
                    "Ljava/lang/IllegalStateException;",
                    "Ljava/lang/Throwable;",
                    "Ljava/lang/RuntimeException;",
                ],
                descriptors
            );
        });
    }

    #[test]
    fn field_reflect_builds_a_mirror_with_interned_name() {
        with_reflect_classes(|vm, thread| {
            let class = resolve_class_sync(thread, "Lt/Refl;").unwrap();
            let label = class.find_field(vm.get_symbol("label")).unwrap();

            let mirror = Rc::new(Cell::new(None));
            let mirror_cb = mirror.clone();
            vm.scheduler().run_until_finished(thread, || {
                label.reflect(thread, Box::new(move |m| mirror_cb.set(m)));
            });
            let mirror = mirror.get().unwrap();
            assert_eq!(class, mirror.clazz);
            assert_eq!("label", mirror.name.as_str());
            assert_eq!("java/lang/String", mirror.type_cls.name().as_str());
            assert_eq!(label.raw_flags(), mirror.modifiers);
            assert_eq!(label.slot(), mirror.slot);
            assert_eq!("TT;", mirror.signature.as_str());
            assert!(mirror.annotations.is_null());

            // A second request interns the same name string.
            let again = Rc::new(Cell::new(None));
            let again_cb = again.clone();
            vm.scheduler().run_until_finished(thread, || {
                label.reflect(thread, Box::new(move |m| again_cb.set(m)));
            });
            assert_eq!(mirror.name, again.get().unwrap().name);
        });
    }

    #[test]
    fn field_reflect_with_unresolvable_type_answers_absent() {
        with_reflect_classes(|vm, thread| {
            let class = resolve_class_sync(thread, "Lt/Refl;").unwrap();
            let broken = class.find_field(vm.get_symbol("broken")).unwrap();

            let called = Rc::new(Cell::new(false));
            let result = Rc::new(Cell::new(Some(FieldMirrorPtr::null())));
            let called_cb = called.clone();
            let result_cb = result.clone();
            vm.scheduler().run_until_finished(thread, || {
                broken.reflect(
                    thread,
                    Box::new(move |m| {
                        called_cb.set(true);
                        result_cb.set(m);
                    }),
                );
            });
            assert!(called.get());
            assert_eq!(None, result.get());
            assert!(thread.has_pending_exception());
            thread.clear_pending_exception();
        });
    }

    #[test]
    fn method_reflect_builds_method_and_constructor_mirrors() {
        with_reflect_classes(|vm, thread| {
            let class = resolve_class_sync(thread, "Lt/Refl;").unwrap();
            let work = class
                .find_self_method(vm.get_symbol("work"), vm.get_symbol("(ILjava/lang/String;)[D"))
                .unwrap();

            let mirror = Rc::new(Cell::new(None));
            let mirror_cb = mirror.clone();
            vm.scheduler().run_until_finished(thread, || {
                work.reflect(thread, false, Box::new(move |m| mirror_cb.set(m)));
            });
            let mirror = mirror.get().unwrap();
            assert_eq!(MirrorKind::Method, mirror.kind);
            assert_eq!("work", mirror.name.as_str());
            assert_eq!(2, mirror.parameter_types.len());
            assert!(mirror.parameter_types[0].is_primitive());
            assert_eq!(
                "java/lang/String",
                mirror.parameter_types[1].name().as_str()
            );
            assert!(mirror.return_type.is_array());
            let exceptions: Vec<String> = mirror
                .exception_types
                .iter()
                .map(|c| c.name().as_str().to_string())
                .collect();
            assert_eq!(
                vec!["java/io/IOException", "java/lang/IllegalStateException"],
                exceptions
            );
            assert_eq!(work.raw_flags(), mirror.modifiers);
            assert!(mirror.signature.is_null());

            let ctor = class
                .find_self_method(vm.get_symbol("<init>"), vm.get_symbol("()V"))
                .unwrap();
            let ctor_mirror = Rc::new(Cell::new(None));
            let ctor_cb = ctor_mirror.clone();
            vm.scheduler().run_until_finished(thread, || {
                ctor.reflect(thread, true, Box::new(move |m| ctor_cb.set(m)));
            });
            let ctor_mirror = ctor_mirror.get().unwrap();
            assert_eq!(MirrorKind::Constructor, ctor_mirror.kind);
            assert!(ctor_mirror.parameter_types.is_empty());
        });
    }

    #[test]
    fn method_reflect_fails_as_one_batch() {
        with_reflect_classes(|vm, thread| {
            let class = resolve_class_sync(thread, "Lt/Refl;").unwrap();
            let broken = class
                .find_self_method(vm.get_symbol("broken"), vm.get_symbol("(Lt/Missing;)V"))
                .unwrap();

            let result = Rc::new(Cell::new(Some(MethodMirrorPtr::null())));
            let result_cb = result.clone();
            vm.scheduler().run_until_finished(thread, || {
                broken.reflect(thread, false, Box::new(move |m| result_cb.set(m)));
            });
            assert_eq!(None, result.get());
            assert!(thread.has_pending_exception());
            thread.clear_pending_exception();
        });
    }
}
