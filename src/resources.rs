//! Per-collection services over the REST client.
//!
//! Each backend collection is a [`Resource`]: its path, record and filter
//! types, key type, page adapter and screen defaults. [`ResourceService`]
//! provides the CRUD + search loop for all of them; collection-specific
//! endpoints are inherent impls further down.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{ConsoleError, ConsoleResult};
use crate::models::{
    AdminLog, AdminLogFilter, Allocation, AllocationFilter, AllocationKey, Asset, AssetCategory,
    AssetFilter, AssetStatus, AuditRequest, Employee, EmployeeFilter, RequestFilter,
    ServiceRequest,
};
use crate::query::{
    count_from_value, ListQuery, PageShape, SearchPage, SearchRequest, Sort, SortOrder,
    DEFAULT_PAGE_SHAPE,
};
use crate::rest::RestClient;

pub trait Resource {
    type Record: Serialize + DeserializeOwned + Send + Sync;
    type Filter: Serialize + Clone + Default + Send + Sync;
    type Key: Display + FromStr;

    /// Collection path, e.g. `/assets`.
    const COLLECTION: &'static str;
    const PAGE_SHAPE: PageShape = DEFAULT_PAGE_SHAPE;
    const DEFAULT_PAGE_SIZE: u32 = 10;

    fn default_sort() -> Option<Sort> {
        None
    }
}

/// Collections that accept `PUT /{collection}/{key}`.
pub trait Updatable: Resource {}

pub struct Assets;
pub struct Employees;
pub struct Allocations;
pub struct ServiceRequests;
pub struct AuditRequests;
pub struct AdminLogs;

impl Resource for Assets {
    type Record = Asset;
    type Filter = AssetFilter;
    type Key = i64;
    const COLLECTION: &'static str = "/assets";
    const DEFAULT_PAGE_SIZE: u32 = 5;

    fn default_sort() -> Option<Sort> {
        Some(Sort::new("AssetName", SortOrder::Asc))
    }
}

impl Resource for Employees {
    type Record = Employee;
    type Filter = EmployeeFilter;
    type Key = i64;
    const COLLECTION: &'static str = "/employees";
    const PAGE_SHAPE: PageShape = PageShape {
        items_keys: &["employees", "Employees"],
        count_keys: &["totalNumberOfRecords", "TotalNumberOfRecords"],
    };
    const DEFAULT_PAGE_SIZE: u32 = 5;

    fn default_sort() -> Option<Sort> {
        Some(Sort::new("CreatedAt", SortOrder::Desc))
    }
}

impl Resource for Allocations {
    type Record = Allocation;
    type Filter = AllocationFilter;
    type Key = AllocationKey;
    const COLLECTION: &'static str = "/allocations";
}

impl Resource for ServiceRequests {
    type Record = ServiceRequest;
    type Filter = RequestFilter;
    type Key = i64;
    const COLLECTION: &'static str = "/servicerequests";
}

impl Resource for AuditRequests {
    type Record = AuditRequest;
    type Filter = RequestFilter;
    type Key = i64;
    const COLLECTION: &'static str = "/auditrequests";
}

impl Resource for AdminLogs {
    type Record = AdminLog;
    type Filter = AdminLogFilter;
    type Key = i64;
    const COLLECTION: &'static str = "/adminlogs";
    const DEFAULT_PAGE_SIZE: u32 = 20;
}

impl Updatable for Assets {}
impl Updatable for Employees {}
impl Updatable for Allocations {}
impl Updatable for ServiceRequests {}
impl Updatable for AuditRequests {}

pub struct ResourceService<R: Resource> {
    client: RestClient,
    _resource: PhantomData<R>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl RestClient {
    pub fn resource<R: Resource>(&self) -> ResourceService<R> {
        ResourceService::new(self.clone())
    }
}

/// Parses a user-supplied key, reporting a validation error on bad input.
pub fn parse_key<R: Resource>(raw: &str) -> ConsoleResult<R::Key> {
    raw.trim().parse::<R::Key>().map_err(|_| {
        ConsoleError::Validation(format!("{raw:?} is not a valid key for {}", R::COLLECTION))
    })
}

impl<R: Resource> ResourceService<R> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    /// Fresh screen state with this collection's defaults.
    pub fn query(&self) -> ListQuery<R::Filter> {
        ListQuery::new(R::Filter::default(), R::DEFAULT_PAGE_SIZE, R::default_sort())
    }

    pub async fn list(&self) -> ConsoleResult<Vec<R::Record>> {
        let body = self.client.get_value(R::COLLECTION).await?;
        match body {
            Value::Null => Ok(Vec::new()),
            body => Ok(serde_json::from_value(body)?),
        }
    }

    pub async fn get(&self, key: &R::Key) -> ConsoleResult<R::Record> {
        self.client
            .get_json(&format!("{}/{}", R::COLLECTION, key))
            .await
    }

    /// Returns the stored record when the backend echoes it back.
    pub async fn create(&self, record: &R::Record) -> ConsoleResult<Option<R::Record>> {
        let body = self
            .client
            .send_json(Method::POST, R::COLLECTION, record)
            .await?;
        echoed(body)
    }

    pub async fn remove(&self, key: &R::Key) -> ConsoleResult<()> {
        self.client
            .delete(&format!("{}/{}", R::COLLECTION, key))
            .await
    }

    pub async fn search(
        &self,
        request: &SearchRequest<R::Filter>,
    ) -> ConsoleResult<SearchPage<R::Record>> {
        request.validate()?;
        let body = self
            .client
            .send_json(Method::POST, &format!("{}/search", R::COLLECTION), request)
            .await?;
        let page = R::PAGE_SHAPE.decode(body)?;
        debug!(
            collection = R::COLLECTION,
            items = page.items.len(),
            total = page.total_count,
            "search page"
        );
        Ok(page)
    }
}

impl<R: Updatable> ResourceService<R> {
    pub async fn update(
        &self,
        key: &R::Key,
        record: &R::Record,
    ) -> ConsoleResult<Option<R::Record>> {
        let body = self
            .client
            .send_json(Method::PUT, &format!("{}/{}", R::COLLECTION, key), record)
            .await?;
        echoed(body)
    }
}

/// Create/update responses are sometimes the record, sometimes empty, and
/// sometimes just a confirmation; only a record is returned.
fn echoed<T: DeserializeOwned>(body: Value) -> ConsoleResult<Option<T>> {
    match body {
        Value::Object(_) => Ok(serde_json::from_value(body).ok()),
        _ => Ok(None),
    }
}

fn count_or_zero(body: &Value) -> u64 {
    count_from_value(body).unwrap_or(0)
}

fn list_or_empty<T: DeserializeOwned>(body: Value) -> ConsoleResult<Vec<T>> {
    match body {
        Value::Array(_) => Ok(serde_json::from_value(body)?),
        _ => Ok(Vec::new()),
    }
}

impl ResourceService<Assets> {
    /// Raw `{categoryName, count}` rows; reshaped by the dashboard.
    pub async fn by_category(&self) -> ConsoleResult<Vec<Value>> {
        list_or_empty(self.client.get_value("/assets/byCategory").await?)
    }

    pub async fn allocated_count(&self) -> ConsoleResult<u64> {
        Ok(count_or_zero(&self.client.get_value("/assets/allocated/count").await?))
    }

    /// Total asset count from `GET /assets`: a list's length, or the `total`
    /// field when the backend returns a summary object.
    pub async fn total_count(&self) -> ConsoleResult<u64> {
        let body = self.client.get_value(Assets::COLLECTION).await?;
        Ok(match &body {
            Value::Array(items) => items.len() as u64,
            Value::Object(object) => ["total", "Total"]
                .iter()
                .find_map(|key| object.get(*key).and_then(count_from_value))
                .unwrap_or(0),
            _ => 0,
        })
    }

    pub async fn statuses(&self) -> ConsoleResult<Vec<AssetStatus>> {
        list_or_empty(self.client.get_value("/assets/statuses").await?)
    }

    pub async fn categories(&self) -> ConsoleResult<Vec<AssetCategory>> {
        list_or_empty(self.client.get_value("/assetcategories").await?)
    }
}

impl ResourceService<ServiceRequests> {
    pub async fn pending_count(&self) -> ConsoleResult<u64> {
        Ok(count_or_zero(
            &self.client.get_value("/servicerequests/pending/count").await?,
        ))
    }

    /// Raw `{month, count}` rows; reshaped by the dashboard.
    pub async fn monthly(&self) -> ConsoleResult<Vec<Value>> {
        list_or_empty(self.client.get_value("/servicerequests/monthly").await?)
    }

    pub async fn by_employee(&self, employee_id: i64) -> ConsoleResult<Vec<ServiceRequest>> {
        list_or_empty(
            self.client
                .get_value(&format!("/servicerequests/employee/{employee_id}"))
                .await?,
        )
    }

    pub async fn by_asset(&self, asset_id: i64) -> ConsoleResult<Vec<ServiceRequest>> {
        list_or_empty(
            self.client
                .get_value(&format!("/servicerequests/asset/{asset_id}"))
                .await?,
        )
    }
}

impl ResourceService<AuditRequests> {
    pub async fn ongoing_count(&self) -> ConsoleResult<u64> {
        Ok(count_or_zero(
            &self.client.get_value("/auditrequests/ongoing/count").await?,
        ))
    }

    pub async fn by_employee(&self, employee_id: i64) -> ConsoleResult<Vec<AuditRequest>> {
        list_or_empty(
            self.client
                .get_value(&format!("/auditrequests/employee/{employee_id}"))
                .await?,
        )
    }
}

impl ResourceService<AdminLogs> {
    pub async fn recent(&self) -> ConsoleResult<Vec<AdminLog>> {
        list_or_empty(self.client.get_value("/adminlogs/recent").await?)
    }

    pub async fn by_admin(&self, admin_id: i64) -> ConsoleResult<Vec<AdminLog>> {
        list_or_empty(
            self.client
                .get_value(&format!("/adminlogs/admin/{admin_id}"))
                .await?,
        )
    }
}

impl ResourceService<Allocations> {
    /// Allocations of one employee ("my assets"), first page at the
    /// collection's page size.
    pub async fn for_employee(&self, employee_id: i64) -> ConsoleResult<SearchPage<Allocation>> {
        let mut query = self.query();
        query.set_filters(AllocationFilter {
            asset_id: None,
            employee_id: Some(employee_id),
        });
        self.search(&query.request()).await
    }
}
