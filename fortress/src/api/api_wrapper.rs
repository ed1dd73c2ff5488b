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

use std::fmt::Debug;

use super::types::*;
use async_trait::async_trait;
use fortress_types::*;

#[async_trait]
pub trait ApiWrapper: Send + Sync + Debug {
    // tenant
    // create a tenant, optionally placed in an existing database
    async fn create_tenant(&self, id: &str, request: CreateTenantRequest) -> FortressResult<()>;
    // list all tenants of the organization
    async fn list_tenants(&self) -> FortressResult<Vec<Tenant>>;
    async fn delete_tenant(&self, id: &str) -> FortressResult<()>;

    // database
    // create a database, returns the id assigned by the api
    async fn create_database(&self, request: CreateDatabaseRequest) -> FortressResult<String>;
    // list all databases of the organization
    async fn list_databases(&self) -> FortressResult<Vec<Database>>;
    async fn delete_database(&self, id: &str) -> FortressResult<()>;

    // encrypted connection details of a tenant or database
    async fn get_connection_uri(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> FortressResult<ConnectionUriResponse>;
}
