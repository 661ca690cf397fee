use crc32fast::Hasher;

use crate::types::{
    CHECKSUM_SIZE, PAGE_FILE_MAGIC, PageId,
    error::{DatabaseError, Result},
};

pub fn calculate_checksum(payload: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

pub fn verify_checksum(payload: &[u8], expected_checksum: u32) -> bool {
    calculate_checksum(payload) == expected_checksum
}

/// Prefix `payload` with the file magic and its CRC32.
pub fn seal(payload: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(PAGE_FILE_MAGIC.len() + CHECKSUM_SIZE + payload.len());
    buffer.extend_from_slice(PAGE_FILE_MAGIC);
    buffer.extend_from_slice(&calculate_checksum(payload).to_le_bytes());
    buffer.extend_from_slice(payload);
    buffer
}

/// Strip and check the header written by [`seal`], returning the payload.
pub fn unseal(bytes: &[u8], page_id: PageId) -> Result<&[u8]> {
    let header_len = PAGE_FILE_MAGIC.len() + CHECKSUM_SIZE;
    if bytes.len() < header_len || &bytes[..PAGE_FILE_MAGIC.len()] != PAGE_FILE_MAGIC {
        return Err(DatabaseError::CorruptedPage {
            page_id,
            reason: "missing file header".to_string(),
        });
    }
    let mut checksum = [0u8; CHECKSUM_SIZE];
    checksum.copy_from_slice(&bytes[PAGE_FILE_MAGIC.len()..header_len]);
    let payload = &bytes[header_len..];
    if !verify_checksum(payload, u32::from_le_bytes(checksum)) {
        tracing::warn!(page_id, "checksum mismatch");
        return Err(DatabaseError::CorruptedPage {
            page_id,
            reason: "checksum mismatch".to_string(),
        });
    }
    Ok(payload)
}
