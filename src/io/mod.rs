mod endian;

pub use endian::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, write_u16_be, write_u16_le, write_u32_be,
    write_u32_le,
};
