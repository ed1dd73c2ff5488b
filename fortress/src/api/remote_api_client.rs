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

use super::api_wrapper::ApiWrapper;
use super::types::*;
use async_trait::async_trait;
use bytes::Bytes;
use fortress_types::*;
use log::debug;
use reqwest::{Method, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://api.fortress.build";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const API_VERSION: &str = "v1";
const API_KEY_HEADER: &str = "Api-Key";

// fortress api over https
pub struct RemoteApiClient {
    base: Url,
    org_id: String,
    api_key: String,
    // retries transient failures, used for idempotent methods only
    http_client: ClientWithMiddleware,
    single_shot_client: ClientWithMiddleware,
}

impl std::fmt::Debug for RemoteApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteApiClient")
            .field("base", &self.base.as_str())
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ApiWrapper for RemoteApiClient {
    async fn create_tenant(&self, id: &str, request: CreateTenantRequest) -> FortressResult<()> {
        let url = self.org_url(&["tenant", id])?;
        self.send(Method::POST, url, Some(encode_body(&request)?))
            .await?;
        Ok(())
    }

    async fn list_tenants(&self) -> FortressResult<Vec<Tenant>> {
        let url = self.org_url(&["tenants"])?;
        let response: ListTenantsResponse = self.send_json(Method::GET, url, None::<&()>).await?;
        Ok(response.tenants)
    }

    async fn delete_tenant(&self, id: &str) -> FortressResult<()> {
        let url = self.org_url(&["tenant", id])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn create_database(&self, request: CreateDatabaseRequest) -> FortressResult<String> {
        let url = self.org_url(&["database"])?;
        let response: CreateDatabaseResponse =
            self.send_json(Method::POST, url, Some(&request)).await?;
        Ok(response.id)
    }

    async fn list_databases(&self) -> FortressResult<Vec<Database>> {
        let url = self.org_url(&["databases"])?;
        let response: ListDatabasesResponse =
            self.send_json(Method::GET, url, None::<&()>).await?;
        Ok(response.databases)
    }

    async fn delete_database(&self, id: &str) -> FortressResult<()> {
        let url = self.org_url(&["database", id])?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    async fn get_connection_uri(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> FortressResult<ConnectionUriResponse> {
        let url = self.org_url(&[kind.as_str(), id, "uri"])?;
        self.send_json(Method::GET, url, None::<&()>).await
    }
}

impl RemoteApiClient {
    pub fn new(
        endpoint: &str,
        org_id: &str,
        api_key: &str,
        http_client: ClientWithMiddleware,
        single_shot_client: ClientWithMiddleware,
    ) -> FortressResult<RemoteApiClient> {
        let base = Url::parse(endpoint).map_err(|e| {
            errno!(FortressStatus::InvalidArgument, "endpoint {} parse error: {:?}", endpoint, e)
        })?;
        if base.cannot_be_a_base() {
            return_errno!(
                FortressStatus::InvalidArgument,
                "endpoint {} cannot be a base url.",
                endpoint
            );
        }

        Ok(RemoteApiClient {
            base,
            org_id: org_id.to_owned(),
            api_key: api_key.trim().to_owned(),
            http_client,
            single_shot_client,
        })
    }

    // GET and DELETE retry transient failures with exponential backoff, POST is sent once
    pub fn with_retries(
        endpoint: &str,
        org_id: &str,
        api_key: &str,
        max_retries: u32,
    ) -> FortressResult<RemoteApiClient> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

        let client = reqwest::Client::new();
        let http_client = ClientBuilder::new(client.clone())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        let single_shot_client = ClientBuilder::new(client).build();
        Self::new(endpoint, org_id, api_key, http_client, single_shot_client)
    }

    // {base}/v1/organization/{org_id}/{segments...}, segments are percent-encoded
    fn org_url(&self, segments: &[&str]) -> FortressResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                errno!(
                    FortressStatus::InvalidArgument,
                    "endpoint {} cannot be a base url.",
                    self.base
                )
            })?
            .pop_if_empty()
            .push(API_VERSION)
            .push("organization")
            .push(&self.org_id)
            .extend(segments);
        Ok(url)
    }

    pub async fn send_json<T: Serialize, U: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&T>,
    ) -> FortressResult<U> {
        let body = match body {
            Some(body) => Some(encode_body(body)?),
            None => None,
        };
        let res_body = self.send(method, url, body).await?;
        serde_json::from_slice(&res_body)
            .map_err(|e| errno!(FortressStatus::ResponseErr, "json decode error: {:?}", e))
    }

    pub async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> FortressResult<Bytes> {
        let path = url.path().to_owned();
        let http_client = if method.is_idempotent() {
            &self.http_client
        } else {
            &self.single_shot_client
        };
        let mut request = http_client
            .request(method.clone(), url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, self.api_key.as_str());
        if let Some(buf) = body {
            request = request.body(buf);
        }

        let res: reqwest::Response = request.send().await.map_err(|e| {
            errno!(FortressStatus::TransportErr, "request {} {} err: {:?}", method, path, e)
        })?;
        let status = res.status();
        let res_body: Bytes = res.bytes().await.map_err(|e| {
            errno!(FortressStatus::TransportErr, "read body of {} {} err: {:?}", method, path, e)
        })?;
        debug!("{} {} -> {} ({} bytes)", method, path, status, res_body.len());

        if !status.is_success() {
            return_errno!(
                FortressStatus::RequestErr {
                    code: status.as_u16()
                },
                "{} {} failed: {}",
                method,
                path,
                status.canonical_reason().unwrap_or("unknown status")
            );
        }
        Ok(res_body)
    }
}

fn encode_body<T: Serialize>(body: &T) -> FortressResult<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|e| errno!(FortressStatus::InternalErr, "json encode error: {:?}", e))
}
