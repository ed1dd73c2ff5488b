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

use super::frame::AES_BLOCK_SIZE;
use fortress_types::*;
use openssl::symm::{Cipher, Crypter, Mode};

// AES-128-CBC decrypt with the cipher's own padding disabled.
pub fn aes_128_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> FortressResult<Vec<u8>> {
    let cipher = Cipher::aes_128_cbc();
    let mut crypter = Crypter::new(cipher, Mode::Decrypt, key, Some(iv))
        .map_err(|e| errno!(FortressStatus::DecryptionFailure, "aes init error: {:?}", e))?;
    crypter.pad(false);

    let mut plaintext = vec![0u8; data.len() + cipher.block_size()];
    let mut count = crypter
        .update(data, &mut plaintext)
        .map_err(|e| errno!(FortressStatus::DecryptionFailure, "aes update error: {:?}", e))?;
    count += crypter
        .finalize(&mut plaintext[count..])
        .map_err(|e| errno!(FortressStatus::DecryptionFailure, "aes finalize error: {:?}", e))?;
    plaintext.truncate(count);
    Ok(plaintext)
}

/// Strip PKCS#7 style padding in place.
///
/// Only the final byte is inspected: it must be in `1..=16` and not exceed the buffer.
pub fn pkcs7_unpad(buf: &mut Vec<u8>) -> FortressResult<()> {
    let pad_len = match buf.last() {
        Some(last) => *last as usize,
        None => return_errno!(FortressStatus::PaddingError, "decrypted buffer is empty."),
    };
    if pad_len == 0 || pad_len > AES_BLOCK_SIZE || pad_len > buf.len() {
        return_errno!(FortressStatus::PaddingError, "invalid padding length {}.", pad_len);
    }
    buf.truncate(buf.len() - pad_len);
    Ok(())
}
