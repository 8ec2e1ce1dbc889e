//! List/Get/Create/Update/Delete for every record type.
//!
//! All record endpoints share one protocol, so a single generic
//! [`RecordService`] serves incidents, change requests and standard change
//! templates; [`Record::PATH`] is the only thing that varies.
//!
//! Transport and decode errors are always returned to the caller, for
//! writes as well as reads.

use std::marker::PhantomData;

use reqwest::Method;

use crate::client::ServiceNowClient;
use crate::context::Context;
use crate::error::NowError;
use crate::models::{Record, Records};
use crate::options::{
    add_options, Action, CreateOptions, DeleteOptions, GetOptions, ListOptions, QueryOptions,
    UpdateOptions,
};
use crate::transport::Transport;

/// Operations on one record type, borrowed from a [`ServiceNowClient`].
///
/// # Example
///
/// ```ignore
/// let ctx = Context::background().with_timeout(Duration::from_secs(10));
/// let open = client
///     .incidents()
///     .list(&ctx, ListOptions::new().with_filter(Filter::eq("active", "true")).with_limit(10))
///     .await?;
/// ```
pub struct RecordService<'a, R, T> {
    client: &'a ServiceNowClient<T>,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Record, T: Transport> RecordService<'a, R, T> {
    pub(crate) fn new(client: &'a ServiceNowClient<T>) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    /// Lists records matching the filters in `opts`.
    ///
    /// Returns an empty vector when nothing matches.
    pub async fn list(&self, ctx: &Context, opts: ListOptions) -> Result<Vec<R>, NowError> {
        let envelope = self.send::<_, ()>(ctx, Method::GET, opts, None).await?;
        tracing::debug!(kind = R::KIND, count = envelope.records.len(), "Listed records");
        Ok(envelope.records)
    }

    /// Fetches the record with the given number.
    ///
    /// Returns an empty record if nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `NowError::Validation` if `number` is empty, before any I/O.
    pub async fn get(
        &self,
        ctx: &Context,
        number: &str,
        mut opts: GetOptions,
    ) -> Result<R, NowError> {
        Self::require(number, "number")?;
        opts.internal_mut().set_query(number_query(number));

        let envelope = self.send::<_, ()>(ctx, Method::GET, opts, None).await?;
        Ok(envelope.into_first())
    }

    /// Creates `record` and returns the record as stored by the server.
    pub async fn create(
        &self,
        ctx: &Context,
        record: &R,
        mut opts: CreateOptions,
    ) -> Result<R, NowError> {
        opts.internal_mut().action = Some(Action::Insert);

        let envelope = self.send(ctx, Method::POST, opts, Some(record)).await?;
        let created = envelope.into_first();
        tracing::debug!(kind = R::KIND, number = ?created.number(), "Created record");
        Ok(created)
    }

    /// Updates the record with the given number with the fields set in `record`.
    ///
    /// # Errors
    ///
    /// Returns `NowError::Validation` if `number` is empty, before any I/O.
    pub async fn update(
        &self,
        ctx: &Context,
        number: &str,
        record: &R,
        mut opts: UpdateOptions,
    ) -> Result<R, NowError> {
        Self::require(number, "number")?;
        let internal = opts.internal_mut();
        internal.set_query(number_query(number));
        internal.action = Some(Action::Update);

        let envelope = self.send(ctx, Method::POST, opts, Some(record)).await?;
        tracing::debug!(kind = R::KIND, number = %number, "Updated record");
        Ok(envelope.into_first())
    }

    /// Deletes the record with the given `sys_id`.
    ///
    /// Returns whatever the server echoes back, usually an empty record.
    ///
    /// # Errors
    ///
    /// Returns `NowError::Validation` if `sys_id` is empty, before any I/O.
    pub async fn delete(
        &self,
        ctx: &Context,
        sys_id: &str,
        mut opts: DeleteOptions,
    ) -> Result<R, NowError> {
        Self::require(sys_id, "sys_id")?;
        let internal = opts.internal_mut();
        internal.sys_id = Some(sys_id.to_string());
        internal.action = Some(Action::DeleteRecord);

        let envelope = self.send::<_, ()>(ctx, Method::POST, opts, None).await?;
        tracing::debug!(kind = R::KIND, sys_id = %sys_id, "Deleted record");
        Ok(envelope.into_first())
    }

    /// Encodes `opts`, sends the request and decodes the records envelope.
    async fn send<O, B>(
        &self,
        ctx: &Context,
        method: Method,
        opts: O,
        body: Option<&B>,
    ) -> Result<Records<R>, NowError>
    where
        O: QueryOptions,
        B: serde::Serialize + ?Sized,
    {
        let path = add_options(R::PATH, Some(opts))?;
        let request = self.client.new_request(method, &path, body)?;

        let mut envelope: Option<Records<R>> = None;
        self.client.execute(ctx, request, &mut envelope).await?;

        Ok(envelope.unwrap_or_default())
    }

    fn require(value: &str, field: &str) -> Result<(), NowError> {
        if value.is_empty() {
            return Err(NowError::empty_identifier(R::KIND, field));
        }
        Ok(())
    }
}

/// The `sysparm_query` selecting a record by number.
fn number_query(number: &str) -> String {
    format!("number={}", number)
}
