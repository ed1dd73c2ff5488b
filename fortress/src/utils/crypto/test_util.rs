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

// Producer side of the connection details protocol, only used by tests.
use super::frame::{AES_BLOCK_SIZE, IV_LENGTH};
use super::hmac::generate_hmac_sha1;
use super::sha::sha256;
use base64::{engine::general_purpose, Engine as _};
use openssl::bn::BigNumContext;
use openssl::derive::Deriver;
use openssl::ec::{EcGroup, EcKey, PointConversionForm};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::symm::{Cipher, Crypter, Mode};

// Vectors below were produced by an independent implementation of the producer.
// Recipient key, base64 SEC1 DER on prime256v1.
pub const TEST_PRIVATE_KEY: &str = "MHcCAQEEIAHSw7Sllod4aVpLPC0eDw4dLDtKWWh3hpWks8LR4PDhoAoGCCqGSM49AwEHoUQDQgAEuJqSZBoEObHXujgQwo98uI+OXo9sEOFWzGDmW7nUF2OqoSXEKYe1UjUcE5HySpgiiqA8yJnAPwtDCUBuJtDA8Q==";
// Another prime256v1 key, unrelated to any frame below.
pub const TEST_OTHER_PRIVATE_KEY: &str = "MHcCAQEEIAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAB3oAoGCCqGSM49AwEHoUQDQgAEBQ8Zc/AgR2hZ8zIXJm+gr0GvLq4rpLIj0ZybHU1aIMXjpyPvjWTfKtH+qaWicv6vE9Dgqba1QK6wKzoQkuFt8A==";
// secp384r1 key
pub const TEST_P384_PRIVATE_KEY: &str = "MIGkAgEBBDAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAEjSgBwYFK4EEACKhZANiAARJI8/Vpmf63Du5NPnjXeWzYbkBtIbHXLjCv6UQW4854C74lHGrhnAVxa09Bc8r4A2KgSG6tTgOHfSR9AIqYB3ggW1AawagTBxQtrwekbA4dRucfJxDqDGiFOwdqEY6xnk=";

// "hello world", iv 00..0f, uncompressed ephemeral key
pub const TEST_HELLO_FRAME: &str = "QQQWCwYVFZ6733/UsRlNQrKYbGsszK15lSG4syYpK2QZs5OiDhJK0qVuzqdPja6E2NkdD1rEoz8iEibRaBzRJVLKAAECAwQFBgcICQoLDA0OD2oMJ9CL0J2kK/ECYr7mwqQzm6y6BXaZCBDvLP7e/v4HKXUZMQ==";
// same frame with the ephemeral key in compressed form
pub const TEST_HELLO_COMPRESSED_FRAME: &str = "IQIWCwYVFZ6733/UsRlNQrKYbGsszK15lSG4syYpK2QZswABAgMEBQYHCAkKCwwNDg9qDCfQi9CdpCvxAmK+5sKkM5usugV2mQgQ7yz+3v7+Byl1GTE=";
// "0123456789abcdef", padded with a whole block
pub const TEST_FULL_BLOCK_FRAME: &str = "QQQWCwYVFZ6733/UsRlNQrKYbGsszK15lSG4syYpK2QZs5OiDhJK0qVuzqdPja6E2NkdD1rEoz8iEibRaBzRJVLKAAECAwQFBgcICQoLDA0OD53p+o0aOFr0FLS1HJbJ0tZyYpzeoIjOVYCIYO94+rfl+59HRBRF+VjYhbb4gkn/nATFAwc=";
// empty plaintext
pub const TEST_EMPTY_FRAME: &str = "QQQWCwYVFZ6733/UsRlNQrKYbGsszK15lSG4syYpK2QZs5OiDhJK0qVuzqdPja6E2NkdD1rEoz8iEibRaBzRJVLKAAECAwQFBgcICQoLDA0ODwPSpnUkIxVOGV3Bnpg52DpAkcWqK5J+Hd6oI3LcY6KXCQ+UKw==";
// {"databaseId":"42","url":"db.fortress.build","port":"5432","username":"tenant_a","password":"s3cr:t@pw","database":"tenant_a"}
pub const TEST_CONNECTION_DETAILS_FRAME: &str = "QQQWCwYVFZ6733/UsRlNQrKYbGsszK15lSG4syYpK2QZs5OiDhJK0qVuzqdPja6E2NkdD1rEoz8iEibRaBzRJVLKAAECAwQFBgcICQoLDA0ODzEeuK+mZ6Em/AVpGzxQJyIPW9p/DVSsf9qLF6R7R0HamCX+FhZXBL7illVfA+7uL7kCwkGSBGAyTFMp50fmlcVAIBfF/VdrsRnZwJjQeQfs6t6WXVUFojWVqs3MpyNa14Un6QXjWRgwe/1ovz+SyC3XFAHWu5rSfSXawbZlHh3RHRZs/AqaMwOOF+aF8l5F3o7e+EM=";

pub const TEST_SHARED_SECRET_HEX: &str =
    "9a02a2e75260023a4ceb36e6869f83daf7336485cd41d57d593712dcc1ad8778";
pub const TEST_DIGEST_HEX: &str =
    "2c1808ae734d67986173b18da30083a4a4da24e76c485dbddc9880ae26271d3e";

pub fn generate_p256() -> EcKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    EcKey::generate(&group).unwrap()
}

pub fn api_key_of(key: &EcKey<Private>) -> String {
    general_purpose::STANDARD.encode(key.private_key_to_der().unwrap())
}

pub fn point_bytes(key: &EcKey<Private>, form: PointConversionForm) -> Vec<u8> {
    let mut ctx = BigNumContext::new().unwrap();
    key.public_key()
        .to_bytes(key.group(), form, &mut ctx)
        .unwrap()
}

pub fn producer_shared_secret(ephemeral: &EcKey<Private>, recipient: &EcKey<Private>) -> Vec<u8> {
    let recipient_public = EcKey::from_public_key(recipient.group(), recipient.public_key()).unwrap();
    let recipient_public = PKey::from_ec_key(recipient_public).unwrap();
    let ephemeral = PKey::from_ec_key(ephemeral.clone()).unwrap();
    let mut deriver = Deriver::new(&ephemeral).unwrap();
    deriver.set_peer(&recipient_public).unwrap();
    deriver.derive_to_vec().unwrap()
}

pub fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = AES_BLOCK_SIZE - data.len() % AES_BLOCK_SIZE;
    let mut padded = data.to_vec();
    padded.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    padded
}

// Build a raw frame around an already padded (block aligned) plaintext.
pub fn seal_padded(
    recipient: &EcKey<Private>,
    ephemeral: &EcKey<Private>,
    iv: &[u8; IV_LENGTH],
    padded: &[u8],
) -> Vec<u8> {
    let digest = sha256(&producer_shared_secret(ephemeral, recipient));

    let mut crypter =
        Crypter::new(Cipher::aes_128_cbc(), Mode::Encrypt, &digest[..16], Some(iv)).unwrap();
    crypter.pad(false);
    let mut ciphertext = vec![0u8; padded.len() + AES_BLOCK_SIZE];
    let mut count = crypter.update(padded, &mut ciphertext).unwrap();
    count += crypter.finalize(&mut ciphertext[count..]).unwrap();
    ciphertext.truncate(count);

    let mut authenticated = iv.to_vec();
    authenticated.extend_from_slice(&ciphertext);
    let tag = generate_hmac_sha1(&digest[16..], &authenticated).unwrap();

    let ephemeral_public_key = point_bytes(ephemeral, PointConversionForm::UNCOMPRESSED);
    let mut raw = vec![ephemeral_public_key.len() as u8];
    raw.extend_from_slice(&ephemeral_public_key);
    raw.extend_from_slice(&authenticated);
    raw.extend_from_slice(&tag);
    raw
}

// Encrypt `plaintext` to `recipient` with a fresh ephemeral key and iv.
pub fn seal(recipient: &EcKey<Private>, plaintext: &[u8]) -> String {
    let ephemeral = generate_p256();
    let mut iv = [0u8; IV_LENGTH];
    openssl::rand::rand_bytes(&mut iv).unwrap();
    general_purpose::STANDARD.encode(seal_padded(recipient, &ephemeral, &iv, &pkcs7_pad(plaintext)))
}
