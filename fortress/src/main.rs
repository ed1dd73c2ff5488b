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

mod config;

use clap::Parser;
use config::{Command, Config, LineArgs, LogConfig};
use fortress::Fortress;
use fortress_types::*;
use log::{info, LevelFilter};
use serde::Serialize;

const LOG_PATTERN: &str = "[{d}] [{t}] [{l}] {m}{n}";

fn parse_level(level: &str) -> LevelFilter {
    match level {
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

// log_size_limit is in MB
fn size_limit_bytes(log_config: &LogConfig) -> u64 {
    log_config
        .log_size_limit
        .unwrap_or(100)
        .saturating_mul(1024 * 1024)
}

fn rolling_file(
    file_name: &str,
    log_config: &LogConfig,
) -> FortressResult<log4rs::append::rolling_file::RollingFileAppender> {
    use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
    use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
    use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
    use log4rs::append::rolling_file::RollingFileAppender;
    use log4rs::encode::pattern::PatternEncoder;

    let fixed_window_roller = FixedWindowRoller::builder()
        .build(
            &(file_name.to_owned() + ".{}"),
            log_config.log_window_size.unwrap_or(5),
        )
        .map_err(|e| errno!(FortressStatus::ConfigErr, "log roller error: {:?}", e))?;
    let size_trigger = SizeTrigger::new(size_limit_bytes(log_config));
    let compound_policy =
        CompoundPolicy::new(Box::new(size_trigger), Box::new(fixed_window_roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(file_name, Box::new(compound_policy))
        .map_err(|e| errno!(FortressStatus::ConfigErr, "open log file {} error: {:?}", file_name, e))
}

// init log
fn init_log(log_config: &LogConfig) -> FortressResult<()> {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config as LogRsConfig, Logger, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let log_level = parse_level(log_config.log_level.as_deref().unwrap_or("info"));

    let mut config_builder = LogRsConfig::builder();
    let mut root_builder = Root::builder();

    // stdout carries command output, logs go to stderr
    if log_config.enable_console_logger.unwrap_or(true) {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        config_builder =
            config_builder.appender(Appender::builder().build("console", Box::new(console)));
        root_builder = root_builder.appender("console");
    }

    if let Some(file_name) = &log_config.log_file_name {
        let fortress_log = rolling_file(file_name, log_config)?;
        config_builder =
            config_builder.appender(Appender::builder().build("fortress_log", Box::new(fortress_log)));
        root_builder = root_builder.appender("fortress_log");
    }

    // monitor lines are only kept when they have a file of their own
    let monitor_logger = match &log_config.monitor_log_file_name {
        Some(file_name) => {
            let monitor_log = rolling_file(file_name, log_config)?;
            config_builder = config_builder
                .appender(Appender::builder().build("monitor_log", Box::new(monitor_log)));
            Logger::builder()
                .appender("monitor_log")
                .additive(false)
                .build("monitor", log_level)
        }
        None => Logger::builder().build("monitor", LevelFilter::Off),
    };

    let config = config_builder
        .logger(monitor_logger)
        .build(root_builder.build(log_level))
        .map_err(|e| errno!(FortressStatus::ConfigErr, "build log config error: {:?}", e))?;

    log4rs::init_config(config)
        .map_err(|e| errno!(FortressStatus::InternalErr, "init log error: {:?}", e))?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> FortressResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| errno!(FortressStatus::InternalErr, "json encode error: {:?}", e))?;
    println!("{}", rendered);
    Ok(())
}

async fn run(args: LineArgs) -> FortressResult<()> {
    let cfg = Config::load(args.config, args.config_path.as_deref())?;
    init_log(&cfg.log_config)?;
    let api_key = cfg.api_key()?;

    let connect = || -> FortressResult<Fortress> {
        let org_id = cfg.org_id()?;
        info!("fortress endpoint {:?}, organization {}", cfg.endpoint(), org_id);
        Fortress::with_endpoint(cfg.endpoint(), org_id, api_key, cfg.max_retries())
    };

    match args.command {
        // no api round trip needed
        Command::Decrypt { ciphertext } => {
            let plaintext = fortress::decrypt(api_key, &ciphertext)?;
            let text = String::from_utf8(plaintext)
                .map_err(|_| errno!(FortressStatus::ResponseErr, "plaintext is not utf-8."))?;
            println!("{}", text);
        }
        Command::ListTenants => print_json(&connect()?.list_tenants().await?)?,
        Command::CreateTenant {
            id,
            alias,
            database_id,
        } => {
            connect()?
                .create_tenant(&id, &alias, database_id.as_deref())
                .await?
        }
        Command::DeleteTenant { id } => connect()?.delete_tenant(&id).await?,
        Command::ListDatabases => print_json(&connect()?.list_databases().await?)?,
        Command::CreateDatabase { alias } => {
            println!("{}", connect()?.create_database(&alias).await?)
        }
        Command::DeleteDatabase { id } => connect()?.delete_database(&id).await?,
        Command::TenantUri { id } => println!("{}", connect()?.connect_tenant_uri(&id).await?),
        Command::DatabaseUri { id } => {
            println!("{}", connect()?.connect_database_uri(&id).await?)
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Parse whole args with clap
    let args = LineArgs::parse();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("fortress: {}", e);
            map_status_to_exit_code(e.errno())
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn size_limit_is_megabytes_and_saturates() {
        let mut log_config = LogConfig::default();
        assert_eq!(size_limit_bytes(&log_config), 100 * 1024 * 1024);
        log_config.log_size_limit = Some(3);
        assert_eq!(size_limit_bytes(&log_config), 3 * 1024 * 1024);
        log_config.log_size_limit = Some(u64::MAX / 2);
        assert_eq!(size_limit_bytes(&log_config), u64::MAX);
    }
}
