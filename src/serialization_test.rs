// Checks the speedy encoding of a value in both byte orders, and that it
// decodes back to the same value.
#[cfg(test)]
macro_rules! serialization_test {
    (type = $type:ty, $({ $name:ident, $structure:expr, le = $le:expr, be = $be:expr }),+) => {
        $(mod $name {
            use super::*;
            use speedy::{Endianness, Readable, Writable};

            #[test]
            fn serialize_deserialize_little_endian() {
                let structure: $type = $structure;

                let encoded = structure.write_to_vec_with_ctx(Endianness::LittleEndian).unwrap();
                let expected: &[u8] = &$le;
                assert_eq!(expected, &encoded[..]);

                let decoded = <$type>::read_from_buffer_with_ctx(Endianness::LittleEndian, &encoded).unwrap();
                assert_eq!(structure, decoded);
            }

            #[test]
            fn serialize_deserialize_big_endian() {
                let structure: $type = $structure;

                let encoded = structure.write_to_vec_with_ctx(Endianness::BigEndian).unwrap();
                let expected: &[u8] = &$be;
                assert_eq!(expected, &encoded[..]);

                let decoded = <$type>::read_from_buffer_with_ctx(Endianness::BigEndian, &encoded).unwrap();
                assert_eq!(structure, decoded);
            }
        })+
    }
}
