use crate::classfile::attributes::Attribute;
use crate::classfile::descriptor;
use crate::classfile::reader::ClassReader;
use crate::classfile::ClassLoadErr;
use crate::object::constant_pool::ConstantPool;
use crate::object::member::MemberInfo;
use crate::object::prelude::*;
use crate::vm::VM;

pub type FieldPtr = Ptr<Field>;

/// One `field_info`. A field's type is its raw descriptor.
pub struct Field {
    member: MemberInfo,
}

impl Field {
    pub fn parse(
        reader: &mut dyn ClassReader,
        cp: &ConstantPool,
        vm: &VM,
    ) -> Result<FieldPtr, ClassLoadErr> {
        let member = MemberInfo::parse(reader, cp)?;
        descriptor::parse_field_descriptor(member.descriptor().as_str())?;
        return Ok(vm.heap().alloc(Field { member }));
    }

    pub fn name(&self) -> SymbolPtr {
        return self.member.name();
    }

    pub fn descriptor(&self) -> SymbolPtr {
        return self.member.descriptor();
    }

    pub fn type_descriptor(&self) -> SymbolPtr {
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
        return FieldAccessFlags::is_static(self.member.access_flags());
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        return self.member.get_attribute(name);
    }

    pub fn get_attributes(&self, name: &str) -> Vec<&Attribute> {
        return self.member.get_attributes(name);
    }
}

#[allow(unused)]
pub enum FieldAccessFlags {
    AccPublic = 0x0001,
    AccPrivate = 0x0002,
    AccProtected = 0x0004,
    AccStatic = 0x0008,
    AccFinal = 0x0010,
    AccVolatile = 0x0040,
    AccTransient = 0x0080,
}

impl FieldAccessFlags {
    pub fn is_static(access_flags: u16) -> bool {
        return access_flags & FieldAccessFlags::AccStatic as u16 != 0;
    }
}
