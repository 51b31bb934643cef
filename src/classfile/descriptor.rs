use super::ClassLoadErr;

/// Token-at-a-time JVM descriptor scanner. Each `next()` consumes exactly one
/// token from the cursor and yields it as a borrowed slice of the input, so
/// concatenating the yielded types reproduces the descriptor byte-for-byte.
pub struct DescriptorParser<'a> {
    value: &'a str,
    offset: usize,
}

#[derive(PartialEq, Debug)]
pub enum Descriptor<'a> {
    Type(&'a str),
    OpenParenthesis,
    CloseParenthesis,
    End,
    Invalid,
}

impl<'a> DescriptorParser<'a> {
    pub fn new(value: &'a str) -> DescriptorParser<'a> {
        return Self { value, offset: 0 };
    }

    pub fn next(&mut self) -> Descriptor<'a> {
        if self.offset >= self.value.len() {
            return Descriptor::End;
        }
        match self.peek() {
            b'(' => {
                self.offset += 1;
                return Descriptor::OpenParenthesis;
            }
            b')' => {
                self.offset += 1;
                return Descriptor::CloseParenthesis;
            }
            _ => {}
        }
        let start = self.offset;
        if !self.consume_type(false) {
            return Descriptor::Invalid;
        }
        return Descriptor::Type(&self.value[start..self.offset]);
    }

    fn peek(&self) -> u8 {
        return self.value.as_bytes()[self.offset];
    }

    /// Consumes one type token: a primitive char, `L<name>;`, or `[` plus
    /// another token. `V` is only a type at the top level (a return type).
    fn consume_type(&mut self, in_array: bool) -> bool {
        if self.offset >= self.value.len() {
            return false;
        }
        let prefix = self.peek();
        self.offset += 1;
        match prefix {
            b'B' | b'S' | b'C' | b'I' | b'J' | b'F' | b'D' | b'Z' => true,
            b'V' => !in_array,
            b'L' => loop {
                if self.offset >= self.value.len() {
                    return false;
                }
                let ch = self.peek();
                self.offset += 1;
                if ch == b';' {
                    return true;
                }
            },
            b'[' => self.consume_type(true),
            _ => false,
        }
    }
}

/// Decoded method descriptor: ordered parameter descriptors plus the return
/// type, each borrowing from the input.
pub struct MethodDescriptor<'a> {
    pub param_types: Vec<&'a str>,
    pub return_type: &'a str,
}

pub fn parse_method_descriptor(descriptor: &str) -> Result<MethodDescriptor, ClassLoadErr> {
    let mut parser = DescriptorParser::new(descriptor);
    if Descriptor::OpenParenthesis != parser.next() {
        return Err(bad_descriptor(descriptor, "expected '('"));
    }
    let mut param_types = Vec::new();
    loop {
        match parser.next() {
            Descriptor::Type("V") => {
                return Err(bad_descriptor(descriptor, "void parameter"));
            }
            Descriptor::Type(param) => param_types.push(param),
            Descriptor::CloseParenthesis => break,
            _ => return Err(bad_descriptor(descriptor, "expected ')'")),
        }
    }
    let return_type = match parser.next() {
        Descriptor::Type(ret) => ret,
        _ => return Err(bad_descriptor(descriptor, "expected return type")),
    };
    if Descriptor::End != parser.next() {
        return Err(bad_descriptor(descriptor, "trailing characters"));
    }
    return Ok(MethodDescriptor {
        param_types,
        return_type,
    });
}

pub fn parse_field_descriptor(descriptor: &str) -> Result<&str, ClassLoadErr> {
    let mut parser = DescriptorParser::new(descriptor);
    let ty = match parser.next() {
        Descriptor::Type("V") => return Err(bad_descriptor(descriptor, "void field")),
        Descriptor::Type(ty) => ty,
        _ => return Err(bad_descriptor(descriptor, "expected field type")),
    };
    if Descriptor::End != parser.next() {
        return Err(bad_descriptor(descriptor, "trailing characters"));
    }
    return Ok(ty);
}

/// Operand slots taken by one value of the given type: two for `J`/`D`, one
/// for everything else.
pub fn word_size(descriptor: &str) -> usize {
    return match descriptor.as_bytes()[0] {
        b'J' | b'D' => 2,
        _ => 1,
    };
}

/// `java/lang/Object` -> `Ljava/lang/Object;`. Array binary names are
/// already descriptors and pass through untouched.
pub fn binary_name_to_descriptor(name: &str) -> String {
    if name.starts_with('[') {
        return name.to_string();
    }
    return format!("L{};", name);
}

fn bad_descriptor(descriptor: &str, reason: &str) -> ClassLoadErr {
    return ClassLoadErr::BadDescriptor(format!("{}: {}", descriptor, reason));
}
