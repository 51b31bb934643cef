use crate::classfile::attributes::{make_attributes, Attribute};
use crate::classfile::reader::ClassReader;
use crate::classfile::ClassLoadErr;
use crate::object::constant_pool::ConstantPool;
use crate::object::prelude::*;

/// State shared by fields and methods: the `field_info`/`method_info`
/// prefix plus the owning class and table slot. `name` and `descriptor`
/// never change after parse; `slot` is assigned exactly once, by the class
/// resolver.
pub struct MemberInfo {
    owner: JClassPtr,
    slot: JInt,
    access_flags: u16,
    name: SymbolPtr,
    descriptor: SymbolPtr,
    attrs: Vec<Attribute>,
}

impl MemberInfo {
    pub fn parse(reader: &mut dyn ClassReader, cp: &ConstantPool) -> Result<MemberInfo, ClassLoadErr> {
        let access_flags = reader.read_ubyte2()?;
        let name_index = reader.read_ubyte2()?;
        let name = cp.get_utf8(name_index);
        debug_assert!(name.as_str().len() > 0);
        let descriptor_index = reader.read_ubyte2()?;
        let descriptor = cp.get_utf8(descriptor_index);
        let attrs = make_attributes(reader, cp)?;
        return Ok(MemberInfo {
            owner: JClassPtr::null(),
            slot: -1,
            access_flags,
            name,
            descriptor,
            attrs,
        });
    }

    pub fn owner(&self) -> JClassPtr {
        debug_assert!(self.owner.is_not_null());
        return self.owner;
    }

    pub fn owner_or_null(&self) -> JClassPtr {
        return self.owner;
    }

    pub fn set_owner(&mut self, owner: JClassPtr) {
        self.owner = owner;
    }

    pub fn slot(&self) -> JInt {
        return self.slot;
    }

    pub fn set_slot(&mut self, slot: JInt) {
        debug_assert!(self.slot == -1, "slot is assigned exactly once");
        self.slot = slot;
    }

    pub fn access_flags(&self) -> u16 {
        return self.access_flags;
    }

    pub fn set_access_flags(&mut self, access_flags: u16) {
        self.access_flags = access_flags;
    }

    pub fn name(&self) -> SymbolPtr {
        return self.name;
    }

    pub fn descriptor(&self) -> SymbolPtr {
        return self.descriptor;
    }

    pub fn attrs(&self) -> &[Attribute] {
        return &self.attrs;
    }

    /// First attribute with the given name.
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        return self.attrs.iter().find(|attr| attr.name() == name);
    }

    /// Every attribute with the given name, preserving class file order.
    pub fn get_attributes(&self, name: &str) -> Vec<&Attribute> {
        return self.attrs.iter().filter(|attr| attr.name() == name).collect();
    }
}
