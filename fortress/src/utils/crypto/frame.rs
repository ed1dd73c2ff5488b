// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use base64::{engine::general_purpose, Engine as _};
use fortress_types::*;

// AES block size and CBC initial vector length
pub const AES_BLOCK_SIZE: usize = 16;
pub const IV_LENGTH: usize = 16;
// HMAC-SHA1 tag length
pub const MAC_TAG_LENGTH: usize = 20;

/// Decoded connection-details payload.
///
/// Wire layout, base64 encoded as a whole:
///
/// ```text
/// [1 byte: ephemeral_len][ephemeral_len bytes: EC point][16 bytes: iv][ciphertext][20 bytes: HMAC-SHA1 tag]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WireFrame {
    pub ephemeral_public_key: Vec<u8>,
    pub iv: [u8; IV_LENGTH],
    pub ciphertext: Vec<u8>,
    pub mac_tag: [u8; MAC_TAG_LENGTH],
}

impl WireFrame {
    pub fn decode(encoded: &str) -> FortressResult<WireFrame> {
        // line-wrapped payloads are accepted
        let compact: Vec<u8> = encoded
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let raw = general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| errno!(FortressStatus::InvalidCiphertext, "base64 decode error: {:?}", e))?;
        Self::from_bytes(&raw)
    }

    pub fn from_bytes(raw: &[u8]) -> FortressResult<WireFrame> {
        let (ephemeral_len, raw) = match raw.split_first() {
            Some((len, rest)) => (*len as usize, rest),
            None => return_errno!(FortressStatus::InvalidCiphertext, "ciphertext is empty."),
        };
        if raw.len() < ephemeral_len {
            return_errno!(
                FortressStatus::InvalidCiphertext,
                "ephemeral public key truncated, expect {} bytes, got {}.",
                ephemeral_len,
                raw.len()
            );
        }
        let (ephemeral_public_key, rest) = raw.split_at(ephemeral_len);

        if rest.len() < IV_LENGTH + MAC_TAG_LENGTH {
            return_errno!(
                FortressStatus::InvalidCiphertext,
                "ciphertext too short: {} bytes after ephemeral key.",
                rest.len()
            );
        }
        let tag_start = rest.len() - MAC_TAG_LENGTH;
        let (iv, ciphertext) = rest[..tag_start].split_at(IV_LENGTH);
        if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
            return_errno!(
                FortressStatus::InvalidCiphertext,
                "ciphertext body length {} is not a positive multiple of {}.",
                ciphertext.len(),
                AES_BLOCK_SIZE
            );
        }

        let mut frame = WireFrame {
            ephemeral_public_key: ephemeral_public_key.to_vec(),
            iv: [0u8; IV_LENGTH],
            ciphertext: ciphertext.to_vec(),
            mac_tag: [0u8; MAC_TAG_LENGTH],
        };
        frame.iv.copy_from_slice(iv);
        frame.mac_tag.copy_from_slice(&rest[tag_start..]);
        Ok(frame)
    }

    // iv || ciphertext, the data covered by the mac tag
    pub fn authenticated_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(IV_LENGTH + self.ciphertext.len());
        data.extend_from_slice(&self.iv);
        data.extend_from_slice(&self.ciphertext);
        data
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn frame_bytes(ephemeral: &[u8], body_len: usize) -> Vec<u8> {
        let mut raw = vec![ephemeral.len() as u8];
        raw.extend_from_slice(ephemeral);
        raw.extend((0..IV_LENGTH).map(|i| i as u8));
        raw.extend(std::iter::repeat(0xab).take(body_len));
        raw.extend(std::iter::repeat(0xcd).take(MAC_TAG_LENGTH));
        raw
    }

    #[test]
    fn splits_fields_at_fixed_offsets() {
        let ephemeral = [4u8, 1, 2, 3, 4];
        let raw = frame_bytes(&ephemeral, 32);
        let encoded = general_purpose::STANDARD.encode(&raw);

        let frame = WireFrame::decode(&encoded).unwrap();
        assert_eq!(frame.ephemeral_public_key, ephemeral);
        assert_eq!(frame.iv.to_vec(), (0..16).collect::<Vec<u8>>());
        assert_eq!(frame.ciphertext, vec![0xab; 32]);
        assert_eq!(frame.mac_tag, [0xcd; MAC_TAG_LENGTH]);

        let aad = frame.authenticated_data();
        assert_eq!(aad.len(), 48);
        assert_eq!(&aad[..16], &frame.iv);
        assert_eq!(&aad[16..], frame.ciphertext.as_slice());
    }

    #[test]
    fn tolerates_whitespace_in_base64() {
        let raw = frame_bytes(&[4u8; 65], 16);
        let encoded = general_purpose::STANDARD.encode(&raw);
        let (head, tail) = encoded.split_at(40);
        let wrapped = format!("{}\n{}\r\n", head, tail);
        assert_eq!(WireFrame::decode(&wrapped).unwrap(), WireFrame::decode(&encoded).unwrap());
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = WireFrame::decode("not*base64!").unwrap_err();
        assert_eq!(err.errno(), FortressStatus::InvalidCiphertext);
    }

    #[test]
    fn rejects_empty_and_truncated_ephemeral_key() {
        assert_eq!(
            WireFrame::from_bytes(&[]).unwrap_err().errno(),
            FortressStatus::InvalidCiphertext
        );
        // claims 65 bytes of ephemeral key but carries 10
        let mut raw = vec![65u8];
        raw.extend_from_slice(&[4u8; 10]);
        assert_eq!(
            WireFrame::from_bytes(&raw).unwrap_err().errno(),
            FortressStatus::InvalidCiphertext
        );
    }

    #[test]
    fn rejects_remainder_shorter_than_iv_and_tag() {
        let mut raw = vec![2u8, 4, 4];
        raw.extend_from_slice(&[0u8; IV_LENGTH + MAC_TAG_LENGTH - 1]);
        let err = WireFrame::from_bytes(&raw).unwrap_err();
        assert_eq!(err.errno(), FortressStatus::InvalidCiphertext);
    }

    #[test]
    fn rejects_empty_or_unaligned_body() {
        for body_len in [0usize, 1, 15, 17, 31] {
            let raw = frame_bytes(&[4u8; 3], body_len);
            let err = WireFrame::from_bytes(&raw).unwrap_err();
            assert_eq!(err.errno(), FortressStatus::InvalidCiphertext, "body {}", body_len);
        }
    }

    #[test]
    fn accepts_zero_length_ephemeral_field() {
        // the point decoder rejects it later, framing itself is well formed
        let raw = frame_bytes(&[], 16);
        let frame = WireFrame::from_bytes(&raw).unwrap();
        assert!(frame.ephemeral_public_key.is_empty());
    }
}
