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

// Process exit codes of the fortress cli.
#[repr(i32)]
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug)]
pub enum FortressStatusT {
    // 0 ~ 9: generic
    Success = 0,
    Internal = 1,
    InvalidArgument = 2,
    InvalidConfig = 3,
    // 10 ~ 19: decryption of connection details
    InvalidKey = 10,
    InvalidCiphertext = 11,
    MacMismatch = 12,
    PaddingError = 13,
    DecryptionFailure = 14,
    // 20 ~ 29: fortress api
    NotFound = 20,
    AlreadyExists = 21,
    RequestFailed = 22,
    Unavailable = 23,
    BadResponse = 24,
}

impl FortressStatusT {
    pub fn as_str(&self) -> &str {
        match *self {
            FortressStatusT::Success => "Success",
            FortressStatusT::Internal => "Internal",
            FortressStatusT::InvalidArgument => "InvalidArgument",
            FortressStatusT::InvalidConfig => "InvalidConfig",
            FortressStatusT::InvalidKey => "InvalidKey",
            FortressStatusT::InvalidCiphertext => "InvalidCiphertext",
            FortressStatusT::MacMismatch => "MacMismatch",
            FortressStatusT::PaddingError => "PaddingError",
            FortressStatusT::DecryptionFailure => "DecryptionFailure",
            FortressStatusT::NotFound => "NotFound",
            FortressStatusT::AlreadyExists => "AlreadyExists",
            FortressStatusT::RequestFailed => "RequestFailed",
            FortressStatusT::Unavailable => "Unavailable",
            FortressStatusT::BadResponse => "BadResponse",
        }
    }
}
