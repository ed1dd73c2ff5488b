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

use super::ec::SharedSecret;
use super::sha::sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const CIPHER_KEY_LENGTH: usize = 16;
pub const MAC_KEY_LENGTH: usize = 16;

/// Symmetric keys split out of SHA-256(shared secret).
///
/// Single hash, no salt and no info string. The producer fixes this derivation, so it
/// must not be replaced by a stronger kdf.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    cipher_key: [u8; CIPHER_KEY_LENGTH],
    mac_key: [u8; MAC_KEY_LENGTH],
}

impl DerivedKeys {
    pub fn derive(shared_secret: &SharedSecret) -> DerivedKeys {
        let mut digest = sha256(shared_secret.as_bytes());
        let mut keys = DerivedKeys {
            cipher_key: [0u8; CIPHER_KEY_LENGTH],
            mac_key: [0u8; MAC_KEY_LENGTH],
        };
        keys.cipher_key.copy_from_slice(&digest[..CIPHER_KEY_LENGTH]);
        keys.mac_key.copy_from_slice(&digest[CIPHER_KEY_LENGTH..]);
        digest.zeroize();
        keys
    }

    pub fn cipher_key(&self) -> &[u8; CIPHER_KEY_LENGTH] {
        &self.cipher_key
    }

    pub fn mac_key(&self) -> &[u8; MAC_KEY_LENGTH] {
        &self.mac_key
    }
}
