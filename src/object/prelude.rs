pub use super::ptr::Ptr;

pub type JBoolean = u8;
pub type JByte = i8;
pub type JChar = u16;
pub type JShort = i16;
pub type JInt = i32;
pub type JLong = i64;
pub type JFloat = f32;
pub type JDouble = f64;

pub use super::array::JArrayPtr;
pub use super::class::JClassPtr;
pub use super::string::JStringPtr;
pub use super::symbol::SymbolPtr;
pub use super::ObjectPtr;
