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

use std::fmt;
use thiserror::Error;

use crate::retcode::*;

// define error type of fortress
#[derive(Error, Debug, Copy, Clone, PartialEq)]
pub enum FortressStatus {
    #[error("success")]
    Success,

    #[error("internal error")]
    InternalErr,

    #[error("assert err")]
    AssertErr,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("invalid configuration")]
    ConfigErr,

    // decryption of connection details
    #[error("invalid private key")]
    InvalidKey,

    #[error("invalid ciphertext")]
    InvalidCiphertext,

    #[error("mac mismatch")]
    MacMismatch,

    #[error("invalid padding")]
    PaddingError,

    #[error("decryption failure")]
    DecryptionFailure,

    // fortress api
    #[error("not found")]
    NotFound,

    #[error("already existed")]
    AlreadyExists,

    #[error("request failed with status code {code}")]
    RequestErr { code: u16 },

    #[error("transport error")]
    TransportErr,

    #[error("unexpected response")]
    ResponseErr,
}

pub fn map_status_to_exit_code(err: FortressStatus) -> i32 {
    let code = match err {
        FortressStatus::Success => FortressStatusT::Success,
        FortressStatus::InvalidArgument => FortressStatusT::InvalidArgument,
        FortressStatus::ConfigErr => FortressStatusT::InvalidConfig,
        FortressStatus::InvalidKey => FortressStatusT::InvalidKey,
        FortressStatus::InvalidCiphertext => FortressStatusT::InvalidCiphertext,
        FortressStatus::MacMismatch => FortressStatusT::MacMismatch,
        FortressStatus::PaddingError => FortressStatusT::PaddingError,
        FortressStatus::DecryptionFailure => FortressStatusT::DecryptionFailure,
        FortressStatus::NotFound => FortressStatusT::NotFound,
        FortressStatus::AlreadyExists => FortressStatusT::AlreadyExists,
        FortressStatus::RequestErr { .. } => FortressStatusT::RequestFailed,
        FortressStatus::TransportErr => FortressStatusT::Unavailable,
        FortressStatus::ResponseErr => FortressStatusT::BadResponse,
        FortressStatus::InternalErr | FortressStatus::AssertErr => FortressStatusT::Internal,
    };
    code as i32
}

pub type FortressResult<T> = core::result::Result<T, Error>;

#[macro_export]
macro_rules! fortress_assert {
    ($cond: expr, $($arg:tt)*) => {{
        if !$cond {
            return_errno!(FortressStatus::AssertErr, $($arg)*)
        }
    }}
}

#[macro_export]
macro_rules! fortress_assert_eq {
    ($left:expr, $right:expr) => {{
        fortress_assert!(
            $left == $right,
            "{} not equal to {}",
            stringify!($left),
            stringify!($right)
        );
    }};
}

#[macro_export]
macro_rules! errno {
    ($errno_expr: expr, $($arg:tt)*) => {{
        let inner_error = {
            let errno: FortressStatus = $errno_expr;
            let msg: String = format!($($arg)*);
            (errno, msg)
        };
        let error = Error::embedded(inner_error, Some(ErrorLocation::new(file!(), line!())));
        error
    }};
}

#[macro_export]
macro_rules! return_errno {
    ($errno_expr: expr, $($arg:tt)*) => {{
        return Err(errno!($errno_expr, $($arg)*));
    }};
}

#[derive(Debug)]
pub struct Error {
    inner: Error__,
    location: Option<ErrorLocation>,
}

#[derive(Debug)]
enum Error__ {
    Embedded((FortressStatus, String)),
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorLocation {
    line: u32,
    file: &'static str,
}

impl Error {
    pub fn embedded(inner: (FortressStatus, String), location_para: Option<ErrorLocation>) -> Error {
        Error {
            inner: Error__::Embedded(inner),
            location: location_para,
        }
    }

    pub fn errno(&self) -> FortressStatus {
        match &self.inner {
            Error__::Embedded((errno, _)) => *errno,
        }
    }

    pub fn message(&self) -> &str {
        match &self.inner {
            Error__::Embedded((_, msg)) => msg,
        }
    }
}

impl ErrorLocation {
    pub fn new(file_para: &'static str, line_para: u32) -> ErrorLocation {
        ErrorLocation {
            file: file_para,
            line: line_para,
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "inner: {}; ", self.inner)?;
        if let Some(location) = self.location {
            write!(f, "location: {}", location)?;
        }
        Ok(())
    }
}

impl fmt::Display for Error__ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error__::Embedded((errno, msg)) => write!(f, "errno: {}, {}", errno, msg),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[line = {}, file = {}]", self.line, self.file)
    }
}
