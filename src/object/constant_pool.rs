use super::prelude::*;

#[derive(Debug, PartialEq)]
pub enum ConstantTag {
    Invalid,
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    Fieldref,
    Methodref,
    InterfaceMethodref,
    NameAndType,
    MethodHandle,
    MethodType,
    InvokeDynamic,
}

impl From<u8> for ConstantTag {
    fn from(tag: u8) -> ConstantTag {
        match tag {
            1 => ConstantTag::Utf8,
            3 => ConstantTag::Integer,
            4 => ConstantTag::Float,
            5 => ConstantTag::Long,
            6 => ConstantTag::Double,
            7 => ConstantTag::Class,
            8 => ConstantTag::String,
            9 => ConstantTag::Fieldref,
            10 => ConstantTag::Methodref,
            11 => ConstantTag::InterfaceMethodref,
            12 => ConstantTag::NameAndType,
            15 => ConstantTag::MethodHandle,
            16 => ConstantTag::MethodType,
            18 => ConstantTag::InvokeDynamic,
            _ => ConstantTag::Invalid,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CpEntry {
    Empty,
    Utf8(SymbolPtr),
    Integer(JInt),
    Float(JFloat),
    Long(JLong),
    Double(JDouble),
    Class { name_index: u16 },
    String { utf8_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { ref_kind: u8, ref_index: u16 },
    MethodType { descriptor_index: u16 },
    InvokeDynamic { bootstrap_index: u16, name_and_type_index: u16 },
}

/// Parsed constant pool. Indexed from 1 to count - 1, like the class file.
pub struct ConstantPool {
    entries: Vec<CpEntry>,
}

pub type ConstantPoolPtr = Ptr<ConstantPool>;

impl ConstantPool {
    pub fn new(count: u16) -> ConstantPool {
        return ConstantPool {
            entries: vec![CpEntry::Empty; count as usize],
        };
    }

    pub fn length(&self) -> u16 {
        return self.entries.len() as u16;
    }

    pub fn set(&mut self, index: u16, entry: CpEntry) {
        self.entries[index as usize] = entry;
    }

    pub fn get(&self, index: u16) -> &CpEntry {
        return &self.entries[index as usize];
    }

    pub fn get_utf8(&self, index: u16) -> SymbolPtr {
        match self.entries[index as usize] {
            CpEntry::Utf8(symbol) => symbol,
            ref other => panic!("constant {} is not CONSTANT_Utf8: {:?}", index, other),
        }
    }

    pub fn get_class_name(&self, index: u16) -> SymbolPtr {
        match self.entries[index as usize] {
            CpEntry::Class { name_index } => self.get_utf8(name_index),
            ref other => panic!("constant {} is not CONSTANT_Class: {:?}", index, other),
        }
    }

    pub fn get_name_and_type(&self, index: u16) -> (SymbolPtr, SymbolPtr) {
        match self.entries[index as usize] {
            CpEntry::NameAndType {
                name_index,
                descriptor_index,
            } => (self.get_utf8(name_index), self.get_utf8(descriptor_index)),
            ref other => panic!("constant {} is not CONSTANT_NameAndType: {:?}", index, other),
        }
    }

    /// Resolves a CONSTANT_Fieldref to (class name, field name, descriptor).
    pub fn get_field_ref(&self, index: u16) -> (SymbolPtr, SymbolPtr, SymbolPtr) {
        match self.entries[index as usize] {
            CpEntry::FieldRef {
                class_index,
                name_and_type_index,
            } => {
                let class_name = self.get_class_name(class_index);
                let (name, descriptor) = self.get_name_and_type(name_and_type_index);
                (class_name, name, descriptor)
            }
            ref other => panic!("constant {} is not CONSTANT_Fieldref: {:?}", index, other),
        }
    }
}
