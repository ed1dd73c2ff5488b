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

use super::aes::{aes_128_cbc_decrypt, pkcs7_unpad};
use super::ec::EcPrivateKeyHolder;
use super::frame::WireFrame;
use super::hmac::verify_hmac_sha1;
use super::kdf::DerivedKeys;
use fortress_types::*;
use log::debug;
use zeroize::Zeroizing;

/// Decrypt a connection details payload.
///
/// `private_key` is the organization api key (base64 SEC1 private key on P-256) and
/// `ciphertext` the base64 frame returned by the api. The stages run strictly in order:
/// load key, decode frame, ECDH, SHA-256 split, HMAC-SHA1 verification, AES-128-CBC
/// decryption and unpadding. The mac is checked before anything is decrypted and no
/// plaintext is returned unless every stage succeeds.
///
/// The returned bytes are opaque here; callers parse them as UTF-8 JSON.
pub fn decrypt(private_key: &str, ciphertext: &str) -> FortressResult<Vec<u8>> {
    decrypt_frame(private_key, ciphertext).map_err(|e| {
        debug!("decrypt connection details failed: {}", e.errno());
        e
    })
}

fn decrypt_frame(private_key: &str, ciphertext: &str) -> FortressResult<Vec<u8>> {
    let holder = EcPrivateKeyHolder::private_key_from_base64(private_key)?;
    let frame = WireFrame::decode(ciphertext)?;
    debug!(
        "decrypt connection details: ephemeral key {} bytes, ciphertext {} bytes",
        frame.ephemeral_public_key.len(),
        frame.ciphertext.len()
    );

    let keys = {
        let shared_secret = holder.agree(&frame.ephemeral_public_key)?;
        DerivedKeys::derive(&shared_secret)
    };

    verify_hmac_sha1(keys.mac_key(), &frame.authenticated_data(), &frame.mac_tag)?;

    let mut plaintext = Zeroizing::new(aes_128_cbc_decrypt(
        keys.cipher_key(),
        &frame.iv,
        &frame.ciphertext,
    )?);
    pkcs7_unpad(&mut plaintext)?;
    Ok(std::mem::take(&mut *plaintext))
}
