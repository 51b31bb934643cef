use super::attributes::make_attributes;
use super::reader::ClassReader;
use super::ClassLoadErr;
use crate::object::class::{JClass, JClassPtr};
use crate::object::constant_pool::{ConstantPool, ConstantPoolPtr, ConstantTag, CpEntry};
use crate::object::field::{Field, FieldPtr};
use crate::object::method::{Method, MethodPtr};
use crate::object::prelude::*;
use crate::vm::VM;

const CLASS_FILE_MAGIC: u32 = 0xCAFEBABE;

/// jvms-4.1: 45 (JDK 1.1) through 52 (Java 8), the era this class library
/// targets.
const MIN_MAJOR_VERSION: u16 = 45;
const MAX_MAJOR_VERSION: u16 = 52;

pub struct ClassParser<'a> {
    reader: Box<dyn ClassReader>,
    vm: &'a VM,
    this_class_name: SymbolPtr,
}

impl<'a> ClassParser<'a> {
    pub fn new(reader: Box<dyn ClassReader>, vm: &'a VM) -> Self {
        ClassParser {
            reader,
            vm,
            this_class_name: SymbolPtr::null(),
        }
    }

    pub fn parse_class(&mut self) -> Result<JClassPtr, ClassLoadErr> {
        let magic = self.reader.read_ubyte4()?;
        if magic != CLASS_FILE_MAGIC {
            return Err(ClassLoadErr::InvalidFormat(
                "cannot identify the magic number".to_string(),
            ));
        }
        let _minor_version = self.reader.read_ubyte2()?;
        let major_version = self.reader.read_ubyte2()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major_version) {
            return Err(ClassLoadErr::InvalidFormat(format!(
                "unsupported class file version {}",
                major_version
            )));
        }
        let cp = self.parse_constant_pool()?;
        let access_flags = self.reader.read_ubyte2()?;
        let this_class = self.reader.read_ubyte2()?;
        let class_name = cp.get_class_name(this_class);
        self.this_class_name = class_name;
        let super_class_index = self.reader.read_ubyte2()?;
        let super_class_name = if super_class_index != 0 {
            cp.get_class_name(super_class_index)
        } else {
            SymbolPtr::null()
        };
        let interfaces = self.parse_interfaces(&cp)?;
        let fields = self.parse_fields(&cp)?;
        let methods = self.parse_methods(&cp)?;
        // Class-level attributes (SourceFile and friends) are consumed but
        // not retained; nothing in the runtime consults them.
        let _class_attrs = make_attributes(self.reader.as_mut(), &cp)?;
        debug_assert_eq!(self.reader.available_bytes().len(), 0);
        log::trace!(
            "parsed class {}: {} fields, {} methods",
            class_name.as_str(),
            fields.len(),
            methods.len()
        );
        return Ok(JClass::new(
            class_name,
            access_flags,
            super_class_name,
            interfaces,
            cp,
            fields,
            methods,
            self.vm,
        ));
    }

    /// jvms-4.4
    fn parse_constant_pool(&mut self) -> Result<ConstantPoolPtr, ClassLoadErr> {
        let cp_count = self.reader.read_ubyte2()?;
        if cp_count == 0 {
            return Err(ClassLoadErr::InvalidFormat(
                "empty constant pool".to_string(),
            ));
        }
        let mut cp = ConstantPool::new(cp_count);
        // The constant_pool table is indexed from 1 to constant_pool_count - 1.
        let mut index = 1;
        while index <= cp_count - 1 {
            let tag = ConstantTag::from(self.reader.read_ubyte1()?);
            match tag {
                ConstantTag::Utf8 => {
                    let length = usize::from(self.reader.read_ubyte2()?);
                    let bytes = self.reader.peek_nbytes(length)?;
                    let content = std::str::from_utf8(bytes).map_err(|e| {
                        ClassLoadErr::InvalidFormat(format!("invalid CONSTANT_Utf8: {}", e))
                    })?;
                    cp.set(index, CpEntry::Utf8(self.vm.get_symbol(content)));
                    self.reader.skip(length);
                }
                ConstantTag::Integer => {
                    cp.set(index, CpEntry::Integer(self.reader.read_ubyte4()? as JInt));
                }
                ConstantTag::Float => {
                    cp.set(
                        index,
                        CpEntry::Float(JFloat::from_bits(self.reader.read_ubyte4()?)),
                    );
                }
                ConstantTag::Long => {
                    let high_bytes = (self.reader.read_ubyte4()? as u64) << 32;
                    let low_bytes = self.reader.read_ubyte4()? as u64;
                    cp.set(index, CpEntry::Long((high_bytes | low_bytes) as JLong));
                    index += 1;
                }
                ConstantTag::Double => {
                    let high_bytes = (self.reader.read_ubyte4()? as u64) << 32;
                    let low_bytes = self.reader.read_ubyte4()? as u64;
                    cp.set(
                        index,
                        CpEntry::Double(JDouble::from_bits(high_bytes | low_bytes)),
                    );
                    index += 1;
                }
                ConstantTag::Class => {
                    cp.set(
                        index,
                        CpEntry::Class {
                            name_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::String => {
                    cp.set(
                        index,
                        CpEntry::String {
                            utf8_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::Fieldref => {
                    cp.set(
                        index,
                        CpEntry::FieldRef {
                            class_index: self.reader.read_ubyte2()?,
                            name_and_type_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::Methodref => {
                    cp.set(
                        index,
                        CpEntry::MethodRef {
                            class_index: self.reader.read_ubyte2()?,
                            name_and_type_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::InterfaceMethodref => {
                    cp.set(
                        index,
                        CpEntry::InterfaceMethodRef {
                            class_index: self.reader.read_ubyte2()?,
                            name_and_type_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::NameAndType => {
                    cp.set(
                        index,
                        CpEntry::NameAndType {
                            name_index: self.reader.read_ubyte2()?,
                            descriptor_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::MethodHandle => {
                    cp.set(
                        index,
                        CpEntry::MethodHandle {
                            ref_kind: self.reader.read_ubyte1()?,
                            ref_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::MethodType => {
                    cp.set(
                        index,
                        CpEntry::MethodType {
                            descriptor_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::InvokeDynamic => {
                    cp.set(
                        index,
                        CpEntry::InvokeDynamic {
                            bootstrap_index: self.reader.read_ubyte2()?,
                            name_and_type_index: self.reader.read_ubyte2()?,
                        },
                    );
                }
                ConstantTag::Invalid => {
                    return Err(ClassLoadErr::InvalidFormat(format!(
                        "unsupported constant tag at index {}",
                        index
                    )));
                }
            }
            index += 1;
        }
        return Ok(self.vm.heap().alloc(cp));
    }

    /// Interface names only; the loader resolves them when the class is
    /// resolved.
    fn parse_interfaces(&mut self, cp: &ConstantPool) -> Result<Vec<SymbolPtr>, ClassLoadErr> {
        let length = self.reader.read_ubyte2()?;
        let mut interfaces = Vec::with_capacity(length as usize);
        for _interface_index in 0..length {
            interfaces.push(cp.get_class_name(self.reader.read_ubyte2()?));
        }
        return Ok(interfaces);
    }

    fn parse_fields(&mut self, cp: &ConstantPool) -> Result<Vec<FieldPtr>, ClassLoadErr> {
        let fields_count = self.reader.read_ubyte2()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _field_index in 0..fields_count {
            fields.push(Field::parse(self.reader.as_mut(), cp, self.vm)?);
        }
        return Ok(fields);
    }

    fn parse_methods(&mut self, cp: &ConstantPool) -> Result<Vec<MethodPtr>, ClassLoadErr> {
        let methods_count = self.reader.read_ubyte2()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _method_index in 0..methods_count {
            methods.push(Method::parse(
                self.reader.as_mut(),
                cp,
                self.vm,
                self.this_class_name,
            )?);
        }
        return Ok(methods);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::attributes::Attribute;
    use crate::classfile::reader::OwnedBytesClassReader;
    use crate::object::class::ClassState;
    use crate::test::{
        run_in_vm, scratch_dir, write_mini_jcl, ClassFileBuilder, FieldSpec, MethodSpec,
    };
    use crate::vm::VMPtr;

    const ACC_PUBLIC: u16 = 0x0001;
    const ACC_STATIC: u16 = 0x0008;

    fn parse(vm: VMPtr, bytes: Vec<u8>) -> Result<JClassPtr, ClassLoadErr> {
        let reader = Box::new(OwnedBytesClassReader::new(bytes));
        return ClassParser::new(reader, vm.as_ref()).parse_class();
    }

    fn in_vm<F: FnOnce(VMPtr)>(f: F) {
        let jcl = scratch_dir("parser_jcl");
        write_mini_jcl(&jcl);
        run_in_vm(&jcl, ".", |vm, _thread| f(vm));
    }

    #[test]
    fn parses_members_and_retains_attributes() {
        in_vm(|vm| {
            let bytes = ClassFileBuilder::new("t/Parsed")
                .field(
                    FieldSpec::new(ACC_PUBLIC, "tag", "Ljava/lang/String;")
                        .with_signature("TT;"),
                )
                .method(
                    MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "go", "(I)I")
                        .with_code(vec![0x1a, 0xac])
                        .with_exceptions(&["java/io/IOException"]),
                )
                .build();
            let class = parse(vm, bytes).unwrap();
            assert_eq!("t/Parsed", class.name().as_str());
            assert_eq!("java/lang/Object", class.super_name().as_str());
            assert_eq!(ClassState::Loaded, class.state());
            assert_eq!(1, class.fields().len());
            assert_eq!(1, class.methods().len());

            let field = class.fields()[0];
            assert_eq!("tag", field.name().as_str());
            // Slots belong to the resolver, not the parser.
            assert_eq!(-1, field.slot());
            match field.get_attribute("Signature") {
                Some(Attribute::Signature { sig }) => assert_eq!("TT;", sig.as_str()),
                _ => panic!("Signature attribute not retained"),
            }

            let method = class.methods()[0];
            assert_eq!(-1, method.slot());
            assert_eq!(class, method.owner());
            match method.get_attribute("Exceptions") {
                Some(Attribute::Exceptions { exceptions }) => {
                    assert_eq!(1, exceptions.len());
                    assert_eq!("java/io/IOException", exceptions[0].as_str());
                }
                _ => panic!("Exceptions attribute not retained"),
            }
            assert_eq!(vec![0x1a, 0xac], method.code_attribute().code);
        });
    }

    #[test]
    fn rejects_a_bad_magic_number() {
        in_vm(|vm| {
            let mut bytes = ClassFileBuilder::new("t/Bad").build();
            bytes[0] = 0xDE;
            assert!(matches!(
                parse(vm, bytes),
                Err(ClassLoadErr::InvalidFormat(_))
            ));
        });
    }

    #[test]
    fn rejects_a_malformed_method_descriptor() {
        in_vm(|vm| {
            let bytes = ClassFileBuilder::new("t/Bad")
                .method(MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "go", "(Q)V").with_code(vec![0xb1]))
                .build();
            assert!(matches!(
                parse(vm, bytes),
                Err(ClassLoadErr::BadDescriptor(_))
            ));
        });
    }

    #[test]
    fn rejects_a_concrete_method_without_code() {
        in_vm(|vm| {
            let bytes = ClassFileBuilder::new("t/Bad")
                .method(MethodSpec::new(ACC_PUBLIC | ACC_STATIC, "go", "()V"))
                .build();
            assert!(matches!(
                parse(vm, bytes),
                Err(ClassLoadErr::InvalidFormat(_))
            ));
        });
    }
}
