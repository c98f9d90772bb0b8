//! String identity hash shared by the shader compiler pass and the host loader.
//!
//! Shaders never carry string bytes into the print buffer; they carry the hash of the literal.
//! Both sides must compute bit-identical values across separate builds, so the algorithm is pinned
//! (not `std::hash::Hash`).

/// Version of the string hash below. Bump together with the GPU-side compiler pass.
pub const STRING_HASH_VERSION: u32 = 1;

const FNV1A32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV1A32_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the UTF-8 bytes of `text` (string hash version 1).
pub fn hash_string(text: &str) -> u32 {
    fnv1a32(text.as_bytes())
}

pub(crate) fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV1A32_OFFSET_BASIS;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(FNV1A32_PRIME);
    }
    hash
}
