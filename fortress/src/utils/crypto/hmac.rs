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

use fortress_types::*;

pub const SHA1_MAC_LENGTH: usize = 20;

pub fn generate_hmac_sha1(mac_key: &[u8], data: &[u8]) -> FortressResult<Vec<u8>> {
    let hmac_key = openssl::pkey::PKey::hmac(mac_key)
        .map_err(|e| errno!(FortressStatus::InternalErr, "hmac init error: {:?}", e))?;
    let mut ctx = openssl::md_ctx::MdCtx::new()
        .map_err(|e| errno!(FortressStatus::InternalErr, "mdctx init error: {:?}", e))?;
    ctx.digest_sign_init(Some(openssl::md::Md::sha1()), &hmac_key)
        .map_err(|e| errno!(FortressStatus::InternalErr, "digest_sign_init error: {:?}", e))?;
    ctx.digest_sign_update(data)
        .map_err(|e| errno!(FortressStatus::InternalErr, "digest_sign_update error: {:?}", e))?;
    let mut hmac = vec![];
    ctx.digest_sign_final_to_vec(&mut hmac).map_err(|e| {
        errno!(
            FortressStatus::InternalErr,
            "digest_sign_final_to_vec error: {:?}",
            e
        )
    })?;
    Ok(hmac)
}

// Recompute the tag over `data` and compare in constant time.
pub fn verify_hmac_sha1(mac_key: &[u8], data: &[u8], tag: &[u8]) -> FortressResult<()> {
    let expected = generate_hmac_sha1(mac_key, data)?;
    fortress_assert_eq!(expected.len(), SHA1_MAC_LENGTH);
    // memcmp::eq panics on length mismatch
    if tag.len() != SHA1_MAC_LENGTH || !openssl::memcmp::eq(&expected, tag) {
        return_errno!(FortressStatus::MacMismatch, "mac tag mismatch");
    }
    Ok(())
}
