use std::cell::{Cell, RefCell};

use crate::object::ptr::Ptr;
use crate::object::{JavaException, JavaExceptionPtr, ObjectPtr};
use crate::runtime::stack::Frame;
use crate::vm::VMPtr;

pub type ThreadPtr = Ptr<JThread>;

thread_local! {
    static VM_THREAD: Cell<ThreadPtr> = Cell::new(ThreadPtr::null());
}

/// One logical JVM thread. The executor multiplexes every logical thread
/// onto the single host thread; a JThread is mostly a frame stack plus the
/// pending-exception channel Java failures travel through.
pub struct JThread {
    vm: VMPtr,
    frames: Vec<Frame>,
    pending_exception: Cell<JavaExceptionPtr>,
    j_thread_obj: Cell<ObjectPtr>,
}

impl JThread {
    pub fn current() -> ThreadPtr {
        let thread = VM_THREAD.with(|t| t.get());
        if thread.is_null() {
            panic!("Thread::current(): cannot find current thread");
        }
        return thread;
    }

    pub fn attach_current_thread(vm: VMPtr) -> ThreadPtr {
        let thread = vm.heap().alloc(JThread {
            vm,
            frames: Vec::new(),
            pending_exception: Cell::new(JavaExceptionPtr::null()),
            j_thread_obj: Cell::new(ObjectPtr::null()),
        });
        vm.thread_mgr().register(thread);
        VM_THREAD.with(|t| t.set(thread));
        return thread;
    }

    pub fn vm(&self) -> VMPtr {
        return self.vm;
    }

    /// Throws a new Java exception on this thread. Native and trapped bodies
    /// call this and return; the caller observes the pending exception.
    pub fn throw_new_exception(&self, class_name: &str, message: &str) {
        let thread = ThreadPtr::from_ref(self);
        let class_name = self.vm.get_symbol(class_name);
        let exception = JavaException::new(class_name, message.to_string(), thread);
        log::debug!("thrown {}: {}", class_name.as_str(), message);
        self.pending_exception.set(exception);
    }

    pub fn set_pending_exception(&self, exception: JavaExceptionPtr) {
        self.pending_exception.set(exception);
    }

    pub fn pending_exception(&self) -> Option<JavaExceptionPtr> {
        let exception = self.pending_exception.get();
        if exception.is_null() {
            return None;
        }
        return Some(exception);
    }

    pub fn has_pending_exception(&self) -> bool {
        return self.pending_exception.get().is_not_null();
    }

    pub fn clear_pending_exception(&self) {
        self.pending_exception.set(JavaExceptionPtr::null());
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        return self.frames.pop();
    }

    pub fn top_frame_mut(&mut self) -> &mut Frame {
        return self.frames.last_mut().expect("no active frame");
    }

    pub fn j_thread_obj(&self) -> ObjectPtr {
        return self.j_thread_obj.get();
    }

    pub fn set_j_thread_obj(&self, obj: ObjectPtr) {
        self.j_thread_obj.set(obj);
    }
}

pub struct ThreadManager {
    threads: RefCell<Vec<ThreadPtr>>,
    main_thread: Cell<ThreadPtr>,
}

impl ThreadManager {
    pub fn new() -> ThreadManager {
        return ThreadManager {
            threads: RefCell::new(Vec::new()),
            main_thread: Cell::new(ThreadPtr::null()),
        };
    }

    pub fn register(&self, thread: ThreadPtr) {
        if self.main_thread.get().is_null() {
            self.main_thread.set(thread);
        }
        self.threads.borrow_mut().push(thread);
    }

    pub fn main_thread(&self) -> ThreadPtr {
        return self.main_thread.get();
    }

    pub fn vm(&self) -> VMPtr {
        return self.main_thread.get().vm();
    }
}
