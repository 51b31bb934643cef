use std::cell::Cell;
use std::rc::Rc;

use crate::runtime::interpreter::Interpreter;
use crate::value::JValue;
use crate::vm::VMPtr;

/// Outcome flag for one cooperative boot step, set by exactly one of the
/// step's continuations.
struct StepStatus {
    flag: Rc<Cell<Option<bool>>>,
}

impl StepStatus {
    fn new() -> StepStatus {
        return StepStatus {
            flag: Rc::new(Cell::new(None)),
        };
    }

    fn ok_cb(&self) -> Box<dyn FnOnce()> {
        let flag = self.flag.clone();
        return Box::new(move || flag.set(Some(true)));
    }

    fn fail_cb(&self) -> Box<dyn FnOnce()> {
        let flag = self.flag.clone();
        return Box::new(move || flag.set(Some(false)));
    }

    fn done_cb(&self) -> Box<dyn FnOnce(bool)> {
        let flag = self.flag.clone();
        return Box::new(move |ok| flag.set(Some(ok)));
    }

    fn succeeded(&self) -> bool {
        return self.flag.get() == Some(true);
    }
}

/// Boots the runtime and drives it to the point where `main` has an
/// invocation frame: preinitialize core classes, init threads, init the
/// system class, initialize the target class, look up and frame `main`.
/// Each step runs inside a run-until-finished scope of the executor.
///
/// A preinitialization failure is fatal and terminates the process; any
/// later failure stops silently, its diagnostics already surfaced through
/// the thread's exception channel.
pub fn launch(
    vm: VMPtr,
    class_name: &str,
    cmdline_args: &[String],
    done: Option<Box<dyn FnOnce()>>,
) {
    let thread = vm.thread_mgr().main_thread();
    debug_assert!(thread.is_not_null(), "VM::init() must run before launch");

    let status = StepStatus::new();
    vm.scheduler().run_until_finished(thread, || {
        vm.preinitialize_core_classes(thread, status.ok_cb(), status.fail_cb());
    });
    if !status.succeeded() {
        if let Some(exception) = thread.pending_exception() {
            log::error!(
                "preinitialization failed: {}: {}",
                exception.class_name().as_str(),
                exception.message()
            );
        } else {
            log::error!("preinitialization failed");
        }
        vm.destroy();
        std::process::exit(1);
    }

    let status = StepStatus::new();
    vm.scheduler().run_until_finished(thread, || {
        vm.init_threads(thread, status.done_cb());
    });
    if !status.succeeded() {
        return;
    }

    if !vm.system_initialized() {
        let status = StepStatus::new();
        vm.scheduler().run_until_finished(thread, || {
            vm.init_system_class(thread, status.done_cb());
        });
        if !status.succeeded() {
            return;
        }
    }

    let descriptor = vm.get_symbol(&format!("L{};", class_name));
    let args: Vec<String> = cmdline_args.to_vec();
    vm.scheduler().run_until_finished(thread, || {
        vm.bootstrap_class_loader().initialize_class(
            thread,
            descriptor,
            Box::new(move |class| {
                let vm = thread.vm();
                vm.set_cmdline_args(thread, &args);
                let main_name = vm.get_symbol("main");
                let main_descriptor = vm.get_symbol("([Ljava/lang/String;)V");
                let main_method = match class.find_self_method(main_name, main_descriptor) {
                    Some(main_method) => main_method,
                    None => {
                        log::error!(
                            "main([Ljava/lang/String;)V not found in {}",
                            class.name().as_str()
                        );
                        if let Some(done) = done {
                            done();
                        }
                        return;
                    }
                };
                let main_args = vec![JValue::with_arr_val(vm.cmdline_args())];
                Interpreter::setup_frame(
                    thread,
                    main_method,
                    main_args,
                    Box::new(move |success| {
                        if success {
                            if let Some(done) = done {
                                done();
                            }
                        }
                    }),
                );
            }),
            Box::new(|| {
                // The failure has been surfaced to the user via the thread.
            }),
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{
        run_in_vm, scratch_dir, write_class, write_mini_jcl, ClassFileBuilder, FieldSpec,
        MethodSpec,
    };
    use std::cell::Cell;
    use std::rc::Rc;

    const ACC_PUBLIC: u16 = 0x0001;
    const ACC_STATIC: u16 = 0x0008;

    #[test]
    fn boots_and_frames_main() {
        let jcl = scratch_dir("launch_jcl");
        write_mini_jcl(&jcl);
        let user_cp = scratch_dir("launch_cp");
        let mut builder = ClassFileBuilder::new("t/Main")
            .field(FieldSpec::new(ACC_PUBLIC | ACC_STATIC, "RAN", "I"));
        let ran_ref = builder.cp.field_ref("t/Main", "RAN", "I");
        write_class(
            &user_cp,
            "t/Main",
            builder
                .method(
                    MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "main", "([Ljava/lang/String;)V")
                        .with_code(vec![
                            0x04, // iconst_1
                            0xb3,
                            (ran_ref >> 8) as u8,
                            ran_ref as u8,
                            0xb1,
                        ]),
                )
                .build(),
        );
        run_in_vm(&jcl, user_cp.to_str().unwrap(), |vm, thread| {
            let completed = Rc::new(Cell::new(false));
            let completed_cb = completed.clone();
            launch(
                vm,
                "t/Main",
                &["hello".to_string(), "world".to_string()],
                Some(Box::new(move || completed_cb.set(true))),
            );
            assert!(completed.get());
            assert!(!thread.has_pending_exception());

            // The boot steps ran: thread object, system class, cmdline args.
            assert!(thread.j_thread_obj().is_not_null());
            assert!(vm.system_initialized());
            let args = vm.cmdline_args();
            assert_eq!(2, args.length());
            assert_eq!("hello", args.get(0).str_val().as_str());
            assert_eq!("world", args.get(1).str_val().as_str());

            // And main actually ran through its frame.
            let main_cls = vm
                .bootstrap_class_loader()
                .find_loaded_by_name("t/Main", thread);
            let ran = main_cls.find_field(vm.get_symbol("RAN")).unwrap();
            assert_eq!(1, main_cls.static_get(ran).int_val());
        });
    }

    #[test]
    fn missing_main_method_still_completes() {
        let jcl = scratch_dir("launch_jcl");
        write_mini_jcl(&jcl);
        let user_cp = scratch_dir("launch_cp");
        write_class(
            &user_cp,
            "t/NoMain",
            ClassFileBuilder::new("t/NoMain").build(),
        );
        run_in_vm(&jcl, user_cp.to_str().unwrap(), |vm, _thread| {
            let completed = Rc::new(Cell::new(false));
            let completed_cb = completed.clone();
            launch(
                vm,
                "t/NoMain",
                &[],
                Some(Box::new(move || completed_cb.set(true))),
            );
            assert!(completed.get());
        });
    }

    #[test]
    fn missing_main_class_stops_silently() {
        let jcl = scratch_dir("launch_jcl");
        write_mini_jcl(&jcl);
        run_in_vm(&jcl, ".", |vm, thread| {
            let completed = Rc::new(Cell::new(false));
            let completed_cb = completed.clone();
            launch(
                vm,
                "t/Absent",
                &[],
                Some(Box::new(move || completed_cb.set(true))),
            );
            assert!(!completed.get());
            let exception = thread.pending_exception().unwrap();
            assert_eq!(
                "java/lang/NoClassDefFoundError",
                exception.class_name().as_str()
            );
            thread.clear_pending_exception();
        });
    }

    #[test]
    fn system_class_initializer_runs_when_present() {
        let jcl = scratch_dir("launch_jcl");
        write_mini_jcl(&jcl);
        let mut builder = ClassFileBuilder::new("java/lang/System")
            .field(FieldSpec::new(ACC_PUBLIC | ACC_STATIC, "BOOTED", "I"));
        let booted_ref = builder.cp.field_ref("java/lang/System", "BOOTED", "I");
        write_class(
            &jcl,
            "java/lang/System",
            builder
                .method(
                    MethodSpec::new(ACC_STATIC, "initializeSystemClass", "()V").with_code(vec![
                        0x10,
                        17,
                        0xb3,
                        (booted_ref >> 8) as u8,
                        booted_ref as u8,
                        0xb1,
                    ]),
                )
                .build(),
        );
        let user_cp = scratch_dir("launch_cp");
        write_class(
            &user_cp,
            "t/Main",
            ClassFileBuilder::new("t/Main")
                .method(
                    MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "main", "([Ljava/lang/String;)V")
                        .with_code(vec![0xb1]),
                )
                .build(),
        );
        run_in_vm(&jcl, user_cp.to_str().unwrap(), |vm, thread| {
            launch(vm, "t/Main", &[], None);
            assert!(vm.system_initialized());
            let system_cls = vm
                .bootstrap_class_loader()
                .find_loaded_by_name("java/lang/System", thread);
            let booted = system_cls.find_field(vm.get_symbol("BOOTED")).unwrap();
            assert_eq!(17, system_cls.static_get(booted).int_val());
        });
    }
}
