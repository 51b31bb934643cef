use super::reader::{ClassReader, ExternalBytesClassReader};
use super::ClassLoadErr;
use crate::object::constant_pool::ConstantPool;
use crate::object::prelude::SymbolPtr;

/// Annotation marker that hides a frame from stack traces; methods carrying
/// it answer `is_hidden`.
const HIDDEN_ANNOTATION: &str = "Ljava/lang/invoke/LambdaForm$Hidden;";

pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Constant pool index; 0 is the catch-all handler.
    pub catch_type: u16,
    /// Resolved catch class name, null for catch-all.
    pub catch_class: SymbolPtr,
}

pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_handlers: Vec<ExceptionHandler>,
    pub attrs: Vec<Attribute>,
}

/// One parsed attribute. The kinds the runtime consumes get typed variants;
/// everything else is retained raw so the ordered attribute list stays
/// complete.
pub enum Attribute {
    Code(CodeAttribute),
    ConstantValue {
        constval_index: u16,
    },
    Signature {
        sig: SymbolPtr,
    },
    Exceptions {
        exceptions: Vec<SymbolPtr>,
    },
    RuntimeVisibleAnnotations {
        raw_bytes: Vec<u8>,
        is_hidden: bool,
    },
    AnnotationDefault {
        raw_bytes: Vec<u8>,
    },
    RuntimeVisibleParameterAnnotations {
        raw_bytes: Vec<u8>,
    },
    Raw {
        name: SymbolPtr,
        bytes: Vec<u8>,
    },
}

impl Attribute {
    pub fn name(&self) -> &str {
        match self {
            Attribute::Code(_) => "Code",
            Attribute::ConstantValue { .. } => "ConstantValue",
            Attribute::Signature { .. } => "Signature",
            Attribute::Exceptions { .. } => "Exceptions",
            Attribute::RuntimeVisibleAnnotations { .. } => "RuntimeVisibleAnnotations",
            Attribute::AnnotationDefault { .. } => "AnnotationDefault",
            Attribute::RuntimeVisibleParameterAnnotations { .. } => {
                "RuntimeVisibleParameterAnnotations"
            }
            Attribute::Raw { name, .. } => name.as_str(),
        }
    }
}

/// Parses an attribute array: u16 count, then name-index/length framed
/// entries. Order is preserved.
pub fn make_attributes(
    reader: &mut dyn ClassReader,
    cp: &ConstantPool,
) -> Result<Vec<Attribute>, ClassLoadErr> {
    let attrs_count = reader.read_ubyte2()?;
    let mut attrs = Vec::with_capacity(attrs_count as usize);
    for _attr_index in 0..attrs_count {
        let attr_name_index = reader.read_ubyte2()?;
        if attr_name_index >= cp.length() {
            return Err(ClassLoadErr::InvalidFormat(
                "invalid attribute name index".to_string(),
            ));
        }
        let attr_length = reader.read_ubyte4()? as usize;
        let attr_name = cp.get_utf8(attr_name_index);
        let attr = match attr_name.as_str() {
            "Code" => parse_code(reader, cp)?,
            "ConstantValue" => Attribute::ConstantValue {
                constval_index: reader.read_ubyte2()?,
            },
            "Signature" => Attribute::Signature {
                sig: cp.get_utf8(reader.read_ubyte2()?),
            },
            "Exceptions" => {
                let num_exceptions = reader.read_ubyte2()?;
                let mut exceptions = Vec::with_capacity(num_exceptions as usize);
                for _exc_index in 0..num_exceptions {
                    exceptions.push(cp.get_class_name(reader.read_ubyte2()?));
                }
                Attribute::Exceptions { exceptions }
            }
            "RuntimeVisibleAnnotations" => {
                let raw_bytes = reader.read_nbytes(attr_length)?;
                let is_hidden = scan_for_hidden_annotation(&raw_bytes, cp)?;
                Attribute::RuntimeVisibleAnnotations {
                    raw_bytes,
                    is_hidden,
                }
            }
            "AnnotationDefault" => Attribute::AnnotationDefault {
                raw_bytes: reader.read_nbytes(attr_length)?,
            },
            "RuntimeVisibleParameterAnnotations" => Attribute::RuntimeVisibleParameterAnnotations {
                raw_bytes: reader.read_nbytes(attr_length)?,
            },
            _ => Attribute::Raw {
                name: attr_name,
                bytes: reader.read_nbytes(attr_length)?,
            },
        };
        attrs.push(attr);
    }
    return Ok(attrs);
}

fn parse_code(
    reader: &mut dyn ClassReader,
    cp: &ConstantPool,
) -> Result<Attribute, ClassLoadErr> {
    let max_stack = reader.read_ubyte2()?;
    let max_locals = reader.read_ubyte2()?;
    let code_length = reader.read_ubyte4()? as usize;
    let code = reader.read_nbytes(code_length)?;
    let ex_tab_length = reader.read_ubyte2()?;
    let mut exception_handlers = Vec::with_capacity(ex_tab_length as usize);
    for _handler_index in 0..ex_tab_length {
        let start_pc = reader.read_ubyte2()?;
        let end_pc = reader.read_ubyte2()?;
        let handler_pc = reader.read_ubyte2()?;
        let catch_type = reader.read_ubyte2()?;
        let catch_class = if catch_type != 0 {
            cp.get_class_name(catch_type)
        } else {
            SymbolPtr::null()
        };
        exception_handlers.push(ExceptionHandler {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
            catch_class,
        });
    }
    let attrs = make_attributes(reader, cp)?;
    return Ok(Attribute::Code(CodeAttribute {
        max_stack,
        max_locals,
        code,
        exception_handlers,
        attrs,
    }));
}

/// Walks the annotation structure far enough to see every top-level
/// annotation type.
fn scan_for_hidden_annotation(raw_bytes: &[u8], cp: &ConstantPool) -> Result<bool, ClassLoadErr> {
    let mut reader = ExternalBytesClassReader::new(raw_bytes);
    let num_annotations = reader.read_ubyte2()?;
    for _anno_index in 0..num_annotations {
        let type_name = cp.get_utf8(reader.read_ubyte2()?);
        if type_name.as_str() == HIDDEN_ANNOTATION {
            return Ok(true);
        }
        let num_element_value_pairs = reader.read_ubyte2()?;
        for _element_index in 0..num_element_value_pairs {
            reader.read_ubyte2()?; // element_name_index
            skip_element_value(&mut reader)?;
        }
    }
    return Ok(false);
}

fn skip_annotation(reader: &mut dyn ClassReader) -> Result<(), ClassLoadErr> {
    reader.read_ubyte2()?; // type_index
    let num_element_value_pairs = reader.read_ubyte2()?;
    for _element_index in 0..num_element_value_pairs {
        reader.read_ubyte2()?; // element_name_index
        skip_element_value(reader)?;
    }
    return Ok(());
}

fn skip_element_value(reader: &mut dyn ClassReader) -> Result<(), ClassLoadErr> {
    let element_tag = reader.read_ubyte1()?;
    match element_tag as char {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 's' | 'c' => {
            reader.read_ubyte2()?;
        }
        'e' => {
            reader.read_ubyte2()?; // type_name_index
            reader.read_ubyte2()?; // const_name_index
        }
        '@' => {
            skip_annotation(reader)?;
        }
        '[' => {
            let num_values = reader.read_ubyte2()?;
            for _value_index in 0..num_values {
                skip_element_value(reader)?;
            }
        }
        _ => {
            return Err(ClassLoadErr::InvalidFormat(format!(
                "unknown element_value tag {}",
                element_tag
            )));
        }
    }
    return Ok(());
}
