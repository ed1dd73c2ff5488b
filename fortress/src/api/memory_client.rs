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
use fortress_types::*;
use log::warn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    tenants: HashMap<String, Tenant>,
    databases: HashMap<String, Database>,
    // encrypted payload per (kind, id)
    connection_details: HashMap<(ResourceKind, String), String>,
    next_database_id: u64,
}

// inmemory implementation, for offline use and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryClient {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    // Store the encrypted connection details returned for `kind`/`id`.
    pub fn put_connection_details(
        &self,
        kind: ResourceKind,
        id: &str,
        encrypted: &str,
    ) -> FortressResult<()> {
        let mut state = self.lock()?;
        state
            .connection_details
            .insert((kind, id.to_owned()), encrypted.to_owned());
        Ok(())
    }

    fn lock(&self) -> FortressResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| errno!(FortressStatus::InternalErr, "memory state poisoned: {}", e))
    }
}

#[async_trait]
impl ApiWrapper for MemoryClient {
    async fn create_tenant(&self, id: &str, request: CreateTenantRequest) -> FortressResult<()> {
        let mut state = self.lock()?;
        if state.tenants.contains_key(id) {
            return_errno!(FortressStatus::AlreadyExists, "tenant {} already exists.", id);
        }
        if let Some(database_id) = &request.database_id {
            if !state.databases.contains_key(database_id) {
                return_errno!(FortressStatus::NotFound, "database {} not found.", database_id);
            }
        }
        state.tenants.insert(
            id.to_owned(),
            Tenant {
                name: id.to_owned(),
                alias: request.alias,
                database_id: request.database_id,
                date_created: None,
            },
        );
        Ok(())
    }

    async fn list_tenants(&self) -> FortressResult<Vec<Tenant>> {
        let state = self.lock()?;
        let mut tenants: Vec<Tenant> = state.tenants.values().cloned().collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }

    async fn delete_tenant(&self, id: &str) -> FortressResult<()> {
        let mut state = self.lock()?;
        if state.tenants.remove(id).is_none() {
            return_errno!(FortressStatus::NotFound, "tenant {} not found.", id);
        }
        state
            .connection_details
            .remove(&(ResourceKind::Tenant, id.to_owned()));
        Ok(())
    }

    async fn create_database(&self, request: CreateDatabaseRequest) -> FortressResult<String> {
        let mut state = self.lock()?;
        state.next_database_id += 1;
        let id = state.next_database_id.to_string();
        state.databases.insert(
            id.clone(),
            Database {
                id: id.clone(),
                alias: request.alias,
                bytes_size: Some(0),
                average_read_iops: Some(0.0),
                average_write_iops: Some(0.0),
                date_created: None,
            },
        );
        Ok(id)
    }

    async fn list_databases(&self) -> FortressResult<Vec<Database>> {
        let state = self.lock()?;
        let mut databases: Vec<Database> = state.databases.values().cloned().collect();
        databases.sort_by_key(|d| d.id.parse::<u64>().unwrap_or(u64::MAX));
        Ok(databases)
    }

    async fn delete_database(&self, id: &str) -> FortressResult<()> {
        let mut state = self.lock()?;
        if state.databases.remove(id).is_none() {
            return_errno!(FortressStatus::NotFound, "database {} not found.", id);
        }
        let mut orphans: Vec<&str> = state
            .tenants
            .values()
            .filter(|t| t.database_id.as_deref() == Some(id))
            .map(|t| t.name.as_str())
            .collect();
        if !orphans.is_empty() {
            orphans.sort_unstable();
            warn!("database {} deleted, still referenced by tenants {:?}", id, orphans);
        }
        state
            .connection_details
            .remove(&(ResourceKind::Database, id.to_owned()));
        Ok(())
    }

    async fn get_connection_uri(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> FortressResult<ConnectionUriResponse> {
        let state = self.lock()?;
        match state.connection_details.get(&(kind, id.to_owned())) {
            Some(encrypted) => Ok(ConnectionUriResponse {
                connection_details: encrypted.clone(),
            }),
            None => return_errno!(
                FortressStatus::NotFound,
                "no connection details for {} {}.",
                kind.as_str(),
                id
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tenant_request(alias: &str, database_id: Option<&str>) -> CreateTenantRequest {
        CreateTenantRequest {
            alias: alias.to_owned(),
            database_id: database_id.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn tenant_lifecycle() {
        let client = MemoryClient::new();
        let db = client
            .create_database(CreateDatabaseRequest {
                alias: "main".to_owned(),
            })
            .await
            .unwrap();
        client
            .create_tenant("t1", tenant_request("first", Some(&db)))
            .await
            .unwrap();
        client.create_tenant("t0", tenant_request("zero", None)).await.unwrap();

        let tenants = client.list_tenants().await.unwrap();
        let names: Vec<&str> = tenants.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["t0", "t1"]);
        assert_eq!(tenants[1].database_id.as_deref(), Some(db.as_str()));

        let err = client
            .create_tenant("t1", tenant_request("again", None))
            .await
            .unwrap_err();
        assert_eq!(err.errno(), FortressStatus::AlreadyExists);

        client.delete_tenant("t1").await.unwrap();
        let err = client.delete_tenant("t1").await.unwrap_err();
        assert_eq!(err.errno(), FortressStatus::NotFound);
    }

    #[tokio::test]
    async fn tenant_requires_existing_database() {
        let client = MemoryClient::new();
        let err = client
            .create_tenant("t1", tenant_request("first", Some("99")))
            .await
            .unwrap_err();
        assert_eq!(err.errno(), FortressStatus::NotFound);
    }

    #[tokio::test]
    async fn database_ids_are_sequential() {
        let client = MemoryClient::new();
        for alias in ["a", "b", "c"] {
            client
                .create_database(CreateDatabaseRequest {
                    alias: alias.to_owned(),
                })
                .await
                .unwrap();
        }
        client.delete_database("2").await.unwrap();
        let ids: Vec<String> = client
            .list_databases()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, ["1", "3"]);
        assert_eq!(
            client.delete_database("2").await.unwrap_err().errno(),
            FortressStatus::NotFound
        );
    }

    #[tokio::test]
    async fn connection_details_are_served_per_kind() {
        let client = MemoryClient::new();
        client
            .put_connection_details(ResourceKind::Tenant, "t1", "cGF5bG9hZA==")
            .unwrap();
        let resp = client
            .get_connection_uri(ResourceKind::Tenant, "t1")
            .await
            .unwrap();
        assert_eq!(resp.connection_details, "cGF5bG9hZA==");

        let err = client
            .get_connection_uri(ResourceKind::Database, "t1")
            .await
            .unwrap_err();
        assert_eq!(err.errno(), FortressStatus::NotFound);
    }
}
