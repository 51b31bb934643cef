use crate::classfile::attributes::{Attribute, CodeAttribute};
use crate::classfile::descriptor;
use crate::classfile::reader::ClassReader;
use crate::classfile::ClassLoadErr;
use crate::native;
use crate::object::constant_pool::ConstantPool;
use crate::object::member::MemberInfo;
use crate::object::prelude::*;
use crate::object::MonitorPtr;
use crate::runtime::stack::OperandStack;
use crate::thread::ThreadPtr;
use crate::value::JValue;
use crate::vm::VM;

pub type MethodPtr = Ptr<Method>;

/// In-process native calling convention: the running thread, the invoked
/// method, and the converted argument vector (thread slot first, receiver
/// next for instance methods, then one slot per parameter).
pub type NativeFn = fn(ThreadPtr, MethodPtr, &[JValue]) -> JValue;

const SIGNATURE_POLYMORPHIC_OWNER: &str = "java/lang/invoke/MethodHandle";
const SIGNATURE_POLYMORPHIC_DESCRIPTOR: &str = "([Ljava/lang/Object;)Ljava/lang/Object;";

/// The callable body selected for a method at parse time. `Unbound` is the
/// deferred native binder; it transitions to `Native` exactly once, on the
/// first invocation that finds a registry entry.
pub enum MethodCode {
    Bytecode(usize),
    Native(NativeFn),
    Trapped(NativeFn),
    Nop,
    Unbound,
    Absent,
}

/// One `method_info`, with the descriptor-derived shape and the resolved
/// code variant.
pub struct Method {
    member: MemberInfo,
    param_types: Vec<SymbolPtr>,
    return_type: SymbolPtr,
    param_bytes: usize,
    num_args: usize,
    code: MethodCode,
}

impl Method {
    pub fn parse(
        reader: &mut dyn ClassReader,
        cp: &ConstantPool,
        vm: &VM,
        owner_name: SymbolPtr,
    ) -> Result<MethodPtr, ClassLoadErr> {
        let mut member = MemberInfo::parse(reader, cp)?;
        let descriptor_symbol = member.descriptor();
        let decoded = descriptor::parse_method_descriptor(descriptor_symbol.as_str())?;
        let param_types: Vec<SymbolPtr> = decoded
            .param_types
            .iter()
            .map(|ty| vm.get_symbol(ty))
            .collect();
        let return_type = vm.get_symbol(decoded.return_type);
        let receiver_slots = if MethodAccessFlags::is_static(member.access_flags()) {
            0
        } else {
            1
        };
        let param_bytes = receiver_slots
            + decoded
                .param_types
                .iter()
                .map(|ty| descriptor::word_size(ty))
                .sum::<usize>();
        let num_args = receiver_slots + decoded.param_types.len();
        let code = Self::resolve_code(&mut member, vm, owner_name)?;
        return Ok(vm.heap().alloc(Method {
            member,
            param_types,
            return_type,
            param_bytes,
            num_args,
            code,
        }));
    }

    /// The resolution cascade, applied once: trapped override, NOP-exempt
    /// native, deferred binder, abstract, then the `Code` attribute.
    fn resolve_code(
        member: &mut MemberInfo,
        vm: &VM,
        owner_name: SymbolPtr,
    ) -> Result<MethodCode, ClassLoadErr> {
        let name_desc = format!(
            "{}{}",
            member.name().as_str(),
            member.descriptor().as_str()
        );
        if let Some(trap) = vm.trapped_methods().get(owner_name.as_str(), &name_desc) {
            log::trace!("trapped method {}::{}", owner_name.as_str(), name_desc);
            member.set_access_flags(
                member.access_flags() | MethodAccessFlags::AccNative as u16,
            );
            return Ok(MethodCode::Trapped(trap));
        }
        if MethodAccessFlags::is_native(member.access_flags()) {
            let name_sym = member.name();
            let name = name_sym.as_str();
            if (name == "registerNatives" || name == "initIDs")
                && member.descriptor().as_str() == "()V"
            {
                return Ok(MethodCode::Nop);
            }
            return Ok(MethodCode::Unbound);
        }
        if MethodAccessFlags::is_abstract(member.access_flags()) {
            return Ok(MethodCode::Absent);
        }
        match member
            .attrs()
            .iter()
            .position(|attr| matches!(attr, Attribute::Code(_)))
        {
            Some(code_index) => Ok(MethodCode::Bytecode(code_index)),
            None => Err(ClassLoadErr::InvalidFormat(format!(
                "{}::{} has neither code nor a native/abstract flag",
                owner_name.as_str(),
                name_desc
            ))),
        }
    }

    pub fn name(&self) -> SymbolPtr {
        return self.member.name();
    }

    pub fn descriptor(&self) -> SymbolPtr {
        return self.member.descriptor();
    }

    pub fn owner(&self) -> JClassPtr {
        return self.member.owner();
    }

    pub fn set_owner(&mut self, owner: JClassPtr) {
        self.member.set_owner(owner);
    }

    pub fn slot(&self) -> JInt {
        return self.member.slot();
    }

    pub fn set_slot(&mut self, slot: JInt) {
        self.member.set_slot(slot);
    }

    pub fn access_flags(&self) -> u16 {
        return self.member.access_flags();
    }

    /// Raw flag bits, round-tripped into reflection `modifiers`.
    pub fn raw_flags(&self) -> u16 {
        return self.member.access_flags();
    }

    pub fn is_static(&self) -> bool {
        return MethodAccessFlags::is_static(self.member.access_flags());
    }

    pub fn is_native(&self) -> bool {
        return MethodAccessFlags::is_native(self.member.access_flags());
    }

    pub fn is_abstract(&self) -> bool {
        return MethodAccessFlags::is_abstract(self.member.access_flags());
    }

    pub fn is_varargs(&self) -> bool {
        return self.member.access_flags() & MethodAccessFlags::AccVarArgs as u16 != 0;
    }

    pub fn is_synchronized(&self) -> bool {
        return self.member.access_flags() & MethodAccessFlags::AccSynchronized as u16 != 0;
    }

    pub fn is_hidden(&self) -> bool {
        match self.get_attribute("RuntimeVisibleAnnotations") {
            Some(Attribute::RuntimeVisibleAnnotations { is_hidden, .. }) => *is_hidden,
            _ => false,
        }
    }

    pub fn param_types(&self) -> &[SymbolPtr] {
        return &self.param_types;
    }

    pub fn return_type(&self) -> SymbolPtr {
        return self.return_type;
    }

    /// Parameter count including the implicit receiver.
    pub fn num_args(&self) -> usize {
        return self.num_args;
    }

    /// Operand slots consumed by an invocation: receiver plus two slots per
    /// wide parameter, one per narrow.
    pub fn param_word_size(&self) -> usize {
        return self.param_bytes;
    }

    pub fn name_and_descriptor(&self) -> String {
        return format!("{}{}", self.name().as_str(), self.descriptor().as_str());
    }

    pub fn full_signature(&self) -> String {
        return format!(
            "{}::{}",
            self.owner().name().as_str(),
            self.name_and_descriptor()
        );
    }

    pub fn is_signature_polymorphic(&self) -> bool {
        let owner = self.member.owner_or_null();
        return owner.is_not_null()
            && owner.name().as_str() == SIGNATURE_POLYMORPHIC_OWNER
            && self.is_native()
            && self.is_varargs()
            && self.descriptor().as_str() == SIGNATURE_POLYMORPHIC_DESCRIPTOR;
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        return self.member.get_attribute(name);
    }

    pub fn get_attributes(&self, name: &str) -> Vec<&Attribute> {
        return self.member.get_attributes(name);
    }

    pub fn code(&self) -> &MethodCode {
        return &self.code;
    }

    /// Fails loudly for anything but a bytecode method; a caller asking a
    /// native method for bytecode is a resolver/interpreter disagreement.
    pub fn code_attribute(&self) -> &CodeAttribute {
        match self.code {
            MethodCode::Bytecode(code_index) => match &self.member.attrs()[code_index] {
                Attribute::Code(code) => code,
                _ => unreachable!("code index points at a non-Code attribute"),
            },
            _ => panic!(
                "method {} has no code attribute",
                self.full_signature()
            ),
        }
    }

    /// The callable body of a native-like method. For an unbound native
    /// this is the deferred binder, which resolves the registry entry on
    /// first call.
    pub fn native_fn(&self) -> NativeFn {
        match self.code {
            MethodCode::Native(func) | MethodCode::Trapped(func) => func,
            MethodCode::Nop => native::nop,
            MethodCode::Unbound => native::bind_and_invoke,
            MethodCode::Bytecode(_) | MethodCode::Absent => panic!(
                "method {} has no native function",
                self.full_signature()
            ),
        }
    }

    /// Resolves the deferred binder against the native registry, memoizing
    /// the `Unbound` -> `Native` transition. Throws `UnsatisfiedLinkError`
    /// on the thread when the registry has no entry.
    pub fn bind_native(&mut self, thread: ThreadPtr) -> Option<NativeFn> {
        match self.code {
            MethodCode::Native(func) => return Some(func),
            MethodCode::Unbound => {}
            _ => panic!("method {} is not a deferred native", self.full_signature()),
        }
        let name_desc = self.name_and_descriptor();
        match thread
            .vm()
            .get_native(self.owner().name().as_str(), &name_desc)
        {
            Some(func) => {
                log::debug!("bound native {}", self.full_signature());
                self.code = MethodCode::Native(func);
                return Some(func);
            }
            None => {
                thread.throw_new_exception(
                    "java/lang/UnsatisfiedLinkError",
                    &self.full_signature(),
                );
                return None;
            }
        }
    }

    /// Pops this method's argument slots off the caller's operand stack,
    /// preserving order.
    pub fn take_args(&self, caller_stack: &mut OperandStack) -> Vec<JValue> {
        return caller_stack.pop_tail(self.param_bytes);
    }

    /// Collapses the two-slot-wide stack layout into the native argument
    /// vector: thread first, then receiver (if any), then one value per
    /// parameter. Signature-polymorphic methods skip marshalling entirely.
    pub fn convert_args(&self, thread: ThreadPtr, raw_params: &[JValue]) -> Vec<JValue> {
        let mut args = Vec::with_capacity(1 + self.num_args);
        args.push(JValue::with_thread_val(thread));
        if self.is_signature_polymorphic() {
            args.extend_from_slice(raw_params);
            return args;
        }
        let mut source_index = 0;
        if !self.is_static() {
            args.push(raw_params[0]);
            source_index = 1;
        }
        for param_type in &self.param_types {
            args.push(raw_params[source_index]);
            source_index += descriptor::word_size(param_type.as_str());
        }
        return args;
    }

    /// Monitor a synchronized invocation must hold: the class mirror's for
    /// static methods, the receiver's otherwise.
    pub fn method_lock(&self, thread: ThreadPtr, raw_params: &[JValue]) -> MonitorPtr {
        if self.is_static() {
            return self.owner().get_class_object(thread).monitor();
        }
        return raw_params[0].obj_val().monitor();
    }
}

#[allow(unused)]
pub enum MethodAccessFlags {
    AccPublic = 0x0001,
    AccPrivate = 0x0002,
    AccProtected = 0x0004,
    AccStatic = 0x0008,
    AccFinal = 0x0010,
    AccSynchronized = 0x0020,
    AccBridge = 0x0040,
    AccVarArgs = 0x0080,
    AccNative = 0x0100,
    AccAbstract = 0x0400,
    AccStrict = 0x0800,
    AccSynthetic = 0x1000,
}

impl MethodAccessFlags {
    pub fn is_static(access_flags: u16) -> bool {
        return access_flags & MethodAccessFlags::AccStatic as u16 != 0;
    }

    pub fn is_native(access_flags: u16) -> bool {
        return access_flags & MethodAccessFlags::AccNative as u16 != 0;
    }

    pub fn is_abstract(access_flags: u16) -> bool {
        return access_flags & MethodAccessFlags::AccAbstract as u16 != 0;
    }
}
