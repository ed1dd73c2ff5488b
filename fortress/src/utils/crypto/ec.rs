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
use openssl::bn::BigNumContext;
use openssl::derive::Deriver;
use openssl::ec::{EcGroup, EcKey, EcPoint};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private, Public};
use zeroize::{Zeroize, ZeroizeOnDrop};

// the only curve spoken by the connection details protocol
pub const CURVE_NID: Nid = Nid::X9_62_PRIME256V1;
// x-coordinate length on P-256
pub const SHARED_SECRET_LENGTH: usize = 32;

const PEM_PREFIX: &str = "-----BEGIN";

/// Raw ECDH output, the x-coordinate of the agreed point.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_LENGTH]);

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// P-256 private key loaded from the organization api key.
pub struct EcPrivateKeyHolder {
    private_key: PKey<Private>,
}

impl EcPrivateKeyHolder {
    // Parse the base64 body of a SEC1 `EC PRIVATE KEY` document.
    // A complete pem document is accepted as well.
    pub fn private_key_from_base64(material: &str) -> FortressResult<EcPrivateKeyHolder> {
        let ec_key = if material.trim_start().starts_with(PEM_PREFIX) {
            EcKey::private_key_from_pem(material.trim().as_bytes()).map_err(|e| {
                errno!(FortressStatus::InvalidKey, "parse sec1 pem private key error: {:?}", e)
            })?
        } else {
            let compact: Vec<u8> = material
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            let der = general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| errno!(FortressStatus::InvalidKey, "private key base64 error: {:?}", e))?;
            EcKey::private_key_from_der(&der).map_err(|e| {
                errno!(FortressStatus::InvalidKey, "parse sec1 der private key error: {:?}", e)
            })?
        };
        Self::from_ec_key(ec_key)
    }

    pub fn from_ec_key(ec_key: EcKey<Private>) -> FortressResult<EcPrivateKeyHolder> {
        if ec_key.group().curve_name() != Some(CURVE_NID) {
            return_errno!(
                FortressStatus::InvalidKey,
                "unsupported curve {:?}, expect prime256v1.",
                ec_key.group().curve_name()
            );
        }
        ec_key
            .check_key()
            .map_err(|e| errno!(FortressStatus::InvalidKey, "private key check failed: {:?}", e))?;
        let private_key = PKey::from_ec_key(ec_key)
            .map_err(|e| errno!(FortressStatus::InvalidKey, "convert ec key to pkey error: {:?}", e))?;
        Ok(EcPrivateKeyHolder { private_key })
    }

    /// ECDH between this key and the sender's ephemeral public key.
    ///
    /// `ephemeral_public_key` is an octet-string encoded P-256 point, compressed or
    /// uncompressed. The point at infinity and points off the curve are rejected.
    pub fn agree(&self, ephemeral_public_key: &[u8]) -> FortressResult<SharedSecret> {
        let peer = decode_public_key(ephemeral_public_key)?;

        let mut deriver = Deriver::new(&self.private_key)
            .map_err(|e| errno!(FortressStatus::InternalErr, "deriver init error: {:?}", e))?;
        deriver
            .set_peer(&peer)
            .map_err(|e| errno!(FortressStatus::InvalidCiphertext, "set ecdh peer error: {:?}", e))?;
        let mut secret = [0u8; SHARED_SECRET_LENGTH];
        let len = deriver
            .derive(&mut secret)
            .map_err(|e| errno!(FortressStatus::InternalErr, "ecdh derive error: {:?}", e))?;
        if len != SHARED_SECRET_LENGTH {
            secret.zeroize();
            return_errno!(
                FortressStatus::InternalErr,
                "unexpected shared secret length {}.",
                len
            );
        }
        Ok(SharedSecret(secret))
    }
}

fn decode_public_key(encoded: &[u8]) -> FortressResult<PKey<Public>> {
    let group = EcGroup::from_curve_name(CURVE_NID)
        .map_err(|e| errno!(FortressStatus::InternalErr, "load prime256v1 group error: {:?}", e))?;
    let mut ctx = BigNumContext::new()
        .map_err(|e| errno!(FortressStatus::InternalErr, "bn ctx init error: {:?}", e))?;

    let point = EcPoint::from_bytes(&group, encoded, &mut ctx).map_err(|e| {
        errno!(FortressStatus::InvalidCiphertext, "decode ephemeral public key error: {:?}", e)
    })?;
    if point.is_infinity(&group) {
        return_errno!(
            FortressStatus::InvalidCiphertext,
            "ephemeral public key is the point at infinity."
        );
    }
    let on_curve = point
        .is_on_curve(&group, &mut ctx)
        .map_err(|e| errno!(FortressStatus::InvalidCiphertext, "point check error: {:?}", e))?;
    if !on_curve {
        return_errno!(
            FortressStatus::InvalidCiphertext,
            "ephemeral public key is not on prime256v1."
        );
    }

    let ec_key = EcKey::from_public_key(&group, &point)
        .map_err(|e| errno!(FortressStatus::InvalidCiphertext, "build public key error: {:?}", e))?;
    ec_key
        .check_key()
        .map_err(|e| errno!(FortressStatus::InvalidCiphertext, "public key check failed: {:?}", e))?;
    PKey::from_ec_key(ec_key)
        .map_err(|e| errno!(FortressStatus::InternalErr, "convert ec key to pkey error: {:?}", e))
}
