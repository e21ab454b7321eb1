//! Typed entity operations
//!
//! One generic implementation of create, read, update, delete, void and
//! query for every [`Entity`], built entirely on the dispatcher.

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use serde_json::{Map, Value};
use tallyline_domain::constants::QUERY_PAGE_SIZE;
use tallyline_domain::{
    take_entity, ChangeDataCapture, CompanyInfo, Customer, Entity, EntityKind, QueryEnvelope,
    Result, TallyError,
};
use tracing::{debug, instrument};

use super::client::ApiClient;
use super::request::{ApiRequest, RequestContext};

/// Fault code the service returns when deleting an object that is already
/// gone.
const OBJECT_NOT_FOUND: &str = "610";

#[derive(Debug, Clone, Copy)]
pub struct EntityService<'a> {
    client: &'a ApiClient,
}

/// Entity body with the `sparse` flag set.
#[derive(Serialize)]
struct Sparse<'a, T> {
    #[serde(flatten)]
    entity: &'a T,
    sparse: bool,
}

impl<'a> EntityService<'a> {
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    async fn fetch_entity<T: Entity>(&self, request: ApiRequest, ctx: &RequestContext) -> Result<T> {
        let body: Map<String, Value> = self.client.dispatch(&request, ctx).await?;
        take_entity(body)
    }

    /// # Errors
    /// Dispatch failures, or `Decode` if the response holds no `T`.
    #[instrument(skip_all, fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn create<T: Entity>(&self, ctx: &RequestContext, entity: &T) -> Result<T> {
        let request = ApiRequest::post(T::KIND.endpoint()).with_json(entity)?;
        self.fetch_entity(request, ctx).await
    }

    /// # Errors
    /// `InvalidRequest` for an empty id, otherwise dispatch failures.
    #[instrument(skip(self, ctx), fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn find_by_id<T: Entity>(&self, ctx: &RequestContext, id: &str) -> Result<T> {
        if id.trim().is_empty() {
            return Err(TallyError::InvalidRequest(format!("missing {} id", T::KIND)));
        }
        let request = ApiRequest::get(format!("{}/{id}", T::KIND.endpoint()));
        self.fetch_entity(request, ctx).await
    }

    /// Full update: fields absent from `entity` are cleared remotely.
    ///
    /// The current `SyncToken` is fetched first, so the update wins over
    /// concurrent edits.
    ///
    /// # Errors
    /// `InvalidRequest` when `entity` has no id, otherwise dispatch failures.
    #[instrument(skip_all, fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn update<T: Entity>(&self, ctx: &RequestContext, entity: &T) -> Result<T> {
        let entity = self.with_current_sync_token(ctx, entity).await?;
        let request = ApiRequest::post(T::KIND.endpoint()).with_json(&entity)?;
        self.fetch_entity(request, ctx).await
    }

    /// Sparse update: only the fields present in `entity` change.
    ///
    /// # Errors
    /// `InvalidRequest` when `entity` has no id, otherwise dispatch failures.
    #[instrument(skip_all, fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn sparse_update<T: Entity>(&self, ctx: &RequestContext, entity: &T) -> Result<T> {
        let entity = self.with_current_sync_token(ctx, entity).await?;
        let request = ApiRequest::post(T::KIND.endpoint())
            .with_json(&Sparse { entity: &entity, sparse: true })?;
        self.fetch_entity(request, ctx).await
    }

    async fn with_current_sync_token<T: Entity>(&self, ctx: &RequestContext, entity: &T) -> Result<T> {
        let id = required_id(entity)?;
        let current: T = self.find_by_id(ctx, id).await?;
        let token = current.sync_token().ok_or_else(|| {
            TallyError::Decode(format!("{} {id} was returned without a SyncToken", T::KIND))
        })?;

        let mut entity = entity.clone();
        entity.set_sync_token(token.to_string());
        Ok(entity)
    }

    /// Delete `entity`, which must carry its id and sync token.
    ///
    /// Deleting an object that no longer exists succeeds: fault code `610`
    /// (object not found) is mapped to `Ok(())` deliberately, so deletes are
    /// idempotent. Every other failure is returned unchanged.
    ///
    /// # Errors
    /// `InvalidRequest` without id or sync token, otherwise dispatch failures.
    #[instrument(skip_all, fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn delete<T: Entity>(&self, ctx: &RequestContext, entity: &T) -> Result<()> {
        let id = required_id(entity)?;
        if entity.sync_token().map_or(true, str::is_empty) {
            return Err(TallyError::InvalidRequest(format!("missing {} sync token", T::KIND)));
        }

        let request = ApiRequest::post(T::KIND.endpoint())
            .with_query("operation", "delete")
            .with_json(entity)?;

        match self.client.dispatch_discard(&request, ctx).await {
            Err(err) if is_object_not_found(&err) => {
                debug!(id, "object already deleted");
                Ok(())
            }
            other => other,
        }
    }

    /// Void a transaction, using its current sync token.
    ///
    /// # Errors
    /// `InvalidRequest` when `entity` has no id, otherwise dispatch failures.
    #[instrument(skip_all, fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn void<T: Entity>(&self, ctx: &RequestContext, entity: &T) -> Result<()> {
        let entity = self.with_current_sync_token(ctx, entity).await?;
        let request = ApiRequest::post(T::KIND.endpoint())
            .with_query("operation", "void")
            .with_json(&entity)?;
        self.client.dispatch_discard(&request, ctx).await
    }

    /// Run a query and return its `T` rows; no rows is an empty list.
    ///
    /// # Errors
    /// Dispatch failures, or `Decode` if a row does not match `T`.
    #[instrument(skip(self, ctx), fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn query<T: Entity>(&self, ctx: &RequestContext, query: &str) -> Result<Vec<T>> {
        let envelope = self.run_query(ctx, query).await?;
        envelope.query_response.items()
    }

    async fn run_query(&self, ctx: &RequestContext, query: &str) -> Result<QueryEnvelope> {
        let request = ApiRequest::get("query").with_query("query", query);
        self.client.dispatch(&request, ctx).await
    }

    /// Total number of `T` objects in the realm.
    ///
    /// # Errors
    /// Dispatch failures.
    pub async fn count<T: Entity>(&self, ctx: &RequestContext) -> Result<u64> {
        let envelope = self.run_query(ctx, &format!("SELECT COUNT(*) FROM {}", T::KIND)).await?;
        Ok(envelope.query_response.total_count.unwrap_or(0))
    }

    /// One page ordered by id. `start_position` is 1-based.
    ///
    /// # Errors
    /// Dispatch failures, or `Decode` if a row does not match `T`.
    pub async fn find_page<T: Entity>(
        &self,
        ctx: &RequestContext,
        start_position: u64,
        page_size: u64,
    ) -> Result<Vec<T>> {
        let query = format!(
            "SELECT * FROM {} ORDERBY Id STARTPOSITION {} MAXRESULTS {}",
            T::KIND,
            start_position.max(1),
            page_size
        );
        self.query(ctx, &query).await
    }

    /// Every `T` in the realm, fetched in pages of a thousand.
    ///
    /// # Errors
    /// The first failing page aborts the listing.
    #[instrument(skip_all, fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn find_all<T: Entity>(&self, ctx: &RequestContext) -> Result<Vec<T>> {
        let total = self.count::<T>(ctx).await?;
        let mut all = Vec::with_capacity(usize::try_from(total).unwrap_or_default());

        let mut offset = 0;
        while offset < total {
            let page: Vec<T> = self.find_page(ctx, offset + 1, QUERY_PAGE_SIZE).await?;
            if page.is_empty() {
                break;
            }
            all.extend(page);
            offset += QUERY_PAGE_SIZE;
        }

        debug!(total, fetched = all.len(), "listing complete");
        Ok(all)
    }

    /// # Errors
    /// Dispatch failures.
    pub async fn company_info(&self, ctx: &RequestContext) -> Result<CompanyInfo> {
        let request = ApiRequest::get(format!("{}/{}", EntityKind::CompanyInfo.endpoint(), ctx.realm));
        self.fetch_entity(request, ctx).await
    }

    /// Sparse update of the realm's company settings. The id and sync token
    /// are taken from the current record, whatever `info` carries.
    ///
    /// # Errors
    /// Dispatch failures, or `Decode` if the current record has no sync token.
    #[instrument(skip_all, fields(realm = %ctx.realm))]
    pub async fn update_company_info(
        &self,
        ctx: &RequestContext,
        info: &CompanyInfo,
    ) -> Result<CompanyInfo> {
        let current = self.company_info(ctx).await?;
        if current.sync_token.is_none() {
            return Err(TallyError::Decode("CompanyInfo was returned without a SyncToken".into()));
        }

        let mut info = info.clone();
        info.id = current.id;
        info.sync_token = current.sync_token;
        let request = ApiRequest::post(EntityKind::CompanyInfo.endpoint())
            .with_json(&Sparse { entity: &info, sparse: true })?;
        self.fetch_entity(request, ctx).await
    }

    /// First customer whose display name equals `name`, if any.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty name, otherwise dispatch failures.
    #[instrument(skip(self, ctx), fields(realm = %ctx.realm))]
    pub async fn find_customer_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Option<Customer>> {
        if name.is_empty() {
            return Err(TallyError::InvalidRequest("missing Customer name".into()));
        }
        let query = format!(
            "SELECT * FROM {} WHERE DisplayName = '{}'",
            EntityKind::Customer,
            escape_literal(name)
        );
        let customers: Vec<Customer> = self.query(ctx, &query).await?;
        Ok(customers.into_iter().next())
    }

    /// Email an invoice or estimate, to `send_to` or else to its billing
    /// address. Returns the document with its updated delivery status.
    ///
    /// # Errors
    /// `InvalidRequest` for an empty id or a kind that cannot be sent,
    /// otherwise dispatch failures.
    #[instrument(skip(self, ctx), fields(kind = %T::KIND, realm = %ctx.realm))]
    pub async fn send<T: Entity>(
        &self,
        ctx: &RequestContext,
        id: &str,
        send_to: Option<&str>,
    ) -> Result<T> {
        if !T::KIND.is_sendable() {
            return Err(TallyError::InvalidRequest(format!("{} cannot be sent", T::KIND)));
        }
        if id.trim().is_empty() {
            return Err(TallyError::InvalidRequest(format!("missing {} id", T::KIND)));
        }
        let mut request = ApiRequest::post(format!("{}/{id}/send", T::KIND.endpoint()));
        if let Some(address) = send_to.filter(|a| !a.is_empty()) {
            request = request.with_query("sendTo", address);
        }
        self.fetch_entity(request, ctx).await
    }

    /// Objects of `kinds` changed since `since`, deletions included.
    ///
    /// # Errors
    /// `InvalidRequest` when `kinds` is empty, otherwise dispatch failures.
    #[instrument(skip_all, fields(realm = %ctx.realm, kinds = kinds.len()))]
    pub async fn change_data_capture<Tz: TimeZone>(
        &self,
        ctx: &RequestContext,
        kinds: &[EntityKind],
        since: &DateTime<Tz>,
    ) -> Result<ChangeDataCapture>
    where
        Tz::Offset: std::fmt::Display,
    {
        if kinds.is_empty() {
            return Err(TallyError::InvalidRequest("change data capture needs an entity kind".into()));
        }
        let entities = kinds.iter().map(|kind| kind.as_str()).collect::<Vec<_>>().join(",");
        let request = ApiRequest::get("cdc")
            .with_query("entities", entities)
            .with_query("changedSince", since.format("%Y-%m-%dT%H:%M:%S%:z").to_string());
        self.client.dispatch(&request, ctx).await
    }
}

fn required_id<T: Entity>(entity: &T) -> Result<&str> {
    entity
        .id()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TallyError::InvalidRequest(format!("missing {} id", T::KIND)))
}

/// Quote-escape a value for use inside a query string literal.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

fn is_object_not_found(err: &TallyError) -> bool {
    err.request_failure().and_then(|f| f.fault_code.as_deref()) == Some(OBJECT_NOT_FOUND)
}
