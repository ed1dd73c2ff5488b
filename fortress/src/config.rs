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

use clap::{Parser, Subcommand};
use fortress::api::remote_api_client::{DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES};
use fortress_types::*;
use merge::Merge;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "fortress.yaml";

#[derive(Parser)]
#[clap(name = "fortress", version, about = "Manage fortress tenants and databases")]
pub struct LineArgs {
    /// config file, fortress.yaml is read when present
    #[clap(long = "config_path")]
    pub config_path: Option<PathBuf>,

    /// Rest of arguments
    #[clap(flatten)]
    pub config: Config,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List all tenants of the organization
    ListTenants,
    /// Create a tenant, optionally inside an existing database
    CreateTenant {
        #[clap(long)]
        id: String,
        #[clap(long)]
        alias: String,
        #[clap(long)]
        database_id: Option<String>,
    },
    /// Delete a tenant
    DeleteTenant {
        #[clap(long)]
        id: String,
    },
    /// List all databases of the organization
    ListDatabases,
    /// Create a database and print its id
    CreateDatabase {
        #[clap(long)]
        alias: String,
    },
    /// Delete a database
    DeleteDatabase {
        #[clap(long)]
        id: String,
    },
    /// Print the postgres uri of a tenant
    TenantUri {
        #[clap(long)]
        id: String,
    },
    /// Print the postgres uri of a database
    DatabaseUri {
        #[clap(long)]
        id: String,
    },
    /// Decrypt a connection details payload locally with the api key
    Decrypt {
        #[clap(long)]
        ciphertext: String,
    },
}

#[derive(Parser, Deserialize, Merge, Default)]
pub struct Config {
    /// organization id
    #[clap(long)]
    pub org_id: Option<String>,
    /// organization api key, base64 sec1 private key
    #[clap(long)]
    pub api_key: Option<String>,
    /// api endpoint
    #[clap(long)]
    pub endpoint: Option<String>,
    /// retries of transient request failures
    #[clap(long)]
    pub max_retries: Option<u32>,
    /// log config
    #[clap(flatten)]
    #[serde(default)]
    pub log_config: LogConfig,
}

#[derive(Parser, Deserialize, Merge, Default)]
pub struct LogConfig {
    /// log file name
    #[clap(long = "log_config.log_file_name")]
    pub log_file_name: Option<String>,
    /// monitor log file name
    #[clap(long = "log_config.monitor_log_file_name")]
    pub monitor_log_file_name: Option<String>,
    /// log level
    #[clap(long = "log_config.log_level")]
    pub log_level: Option<String>,
    /// enable console logger
    #[clap(long = "log_config.enable_console_logger")]
    pub enable_console_logger: Option<bool>,
    /// log window size
    #[clap(long = "log_config.log_window_size")]
    pub log_window_size: Option<u32>,
    /// log size limit, MB
    #[clap(long = "log_config.log_size_limit")]
    pub log_size_limit: Option<u64>,
}

impl Config {
    // command line first, then the config file, then defaults
    // only the default config file may be absent
    pub fn load(args: Config, config_path: Option<&Path>) -> FortressResult<Config> {
        let (config_path, explicit) = match config_path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };
        let file_config = match File::open(config_path) {
            Ok(f) => Some(
                serde_yaml::from_reader::<_, Config>(BufReader::new(f)).map_err(|e| {
                    errno!(
                        FortressStatus::ConfigErr,
                        "error in configuration file {}: {}",
                        config_path.display(),
                        e
                    )
                })?,
            ),
            Err(e) if !explicit && e.kind() == ErrorKind::NotFound => None,
            Err(e) => return_errno!(
                FortressStatus::ConfigErr,
                "open configuration file {} error: {}",
                config_path.display(),
                e
            ),
        };
        Ok(Self::from_sources(args, file_config))
    }

    pub fn from_sources(args: Config, file_config: Option<Config>) -> Config {
        let mut config = args;
        if let Some(file_config) = file_config {
            config.merge(file_config);
        }
        config.merge(Config::defaults());
        config
    }

    fn defaults() -> Config {
        Config {
            org_id: None,
            api_key: None,
            endpoint: Some(DEFAULT_ENDPOINT.to_owned()),
            max_retries: Some(DEFAULT_MAX_RETRIES),
            log_config: LogConfig {
                log_file_name: None,
                monitor_log_file_name: None,
                log_level: Some("info".to_owned()),
                enable_console_logger: Some(true),
                log_window_size: Some(5),
                log_size_limit: Some(100),
            },
        }
    }

    pub fn org_id(&self) -> FortressResult<&str> {
        required("org_id", &self.org_id)
    }

    pub fn api_key(&self) -> FortressResult<&str> {
        required("api_key", &self.api_key)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }
}

fn required<'a>(name: &str, value: &'a Option<String>) -> FortressResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => return_errno!(
            FortressStatus::ConfigErr,
            "{} is required, pass --{} or set it in the config file.",
            name,
            name.replace('_', "-")
        ),
    }
}
