use crate::error::{PageError, Result};
use crate::page::{Page, PageCollection};
use crate::rewrite::{QueryRewriter, LIMIT_PARAM, OFFSET_PARAM};
use crate::traits::Executor;
use crate::types::{BindParameter, FetchConfig, ParamType};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::debug;

/// Orchestrates one windowed fetch plus one row-count query per call.
///
/// A paginator is reusable: set a new query, bind new parameters, execute
/// again. It is not safe for concurrent use of a single instance - the bind
/// list is mutated in place - so concurrent callers need separate instances
/// or external synchronization.
///
/// The page-result type is a type parameter bounded by [`PageCollection`]
/// and defaults to the bundled [`Page`].
///
/// # Example
///
/// ```no_run
/// use sqlpager::{Executor, Paginator, PageCollection};
///
/// # async fn example(executor: impl Executor) -> sqlpager::Result<()> {
/// let mut paginator = Paginator::new(executor);
/// paginator.set_query("SELECT id, name FROM user WHERE role = :role")?;
/// paginator.bind("role", "admin");
///
/// let page = paginator.execute(15, 1, None).await?;
/// println!("{} of {} rows", page.rows().len(), page.total());
/// # Ok(())
/// # }
/// ```
pub struct Paginator<E, P = Page>
where
    E: Executor,
    P: PageCollection,
{
    executor: E,
    query: Option<String>,
    binds: Vec<BindParameter>,
    page_type: PhantomData<P>,
}

impl<E: Executor> Paginator<E> {
    /// Create a paginator producing the default [`Page`] result type
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            query: None,
            binds: Vec::new(),
            page_type: PhantomData,
        }
    }
}

impl<E, P> Paginator<E, P>
where
    E: Executor,
    P: PageCollection,
{
    /// Rebind the paginator to a different page-result type.
    ///
    /// The executor, the current query, and any accumulated binds carry
    /// over; only the produced type changes.
    pub fn with_page_type<Q: PageCollection>(self) -> Paginator<E, Q> {
        Paginator {
            executor: self.executor,
            query: self.query,
            binds: self.binds,
            page_type: PhantomData,
        }
    }

    /// Set the base query to paginate.
    ///
    /// The query must not carry its own limiting clause; a trailing
    /// statement terminator is stripped before storing.
    pub fn set_query(&mut self, query: impl Into<String>) -> Result<()> {
        let query = query.into();
        QueryRewriter::ensure_no_limit(&query)?;

        self.query = Some(QueryRewriter::strip_terminator(&query).to_string());
        Ok(())
    }

    /// The currently configured base query, if any
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Register a bind parameter, inferring its type tag from the value
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.binds.push(BindParameter::inferred(name, value));
    }

    /// Register a bind parameter with an explicit type tag
    pub fn bind_typed(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        param_type: ParamType,
    ) {
        self.binds.push(BindParameter::new(name, value, param_type));
    }

    /// Fetch one page of the configured query.
    ///
    /// Runs the windowed query with the caller's binds plus `offset` and
    /// `limit`, then the count query with the caller's binds only, and
    /// assembles the page from `(rows, page, per_page, total)`. The two
    /// round trips are strictly sequential; if the windowed fetch fails the
    /// count query never runs.
    ///
    /// The accumulated bind list is cleared on every exit path, success or
    /// failure, so a later call on the same paginator starts clean.
    pub async fn execute(
        &mut self,
        per_page: u64,
        page: u64,
        fetch: Option<FetchConfig>,
    ) -> Result<P> {
        let outcome = self.run(per_page, page, fetch).await;

        // Reset the binds to not effect the next pagination
        self.binds.clear();

        outcome
    }

    async fn run(&self, per_page: u64, page: u64, fetch: Option<FetchConfig>) -> Result<P> {
        if per_page == 0 || page == 0 {
            return Err(PageError::invalid_configuration(format!(
                "page size and page number must both be at least 1, got size {} page {}",
                per_page, page
            )));
        }

        let query = self
            .query
            .as_deref()
            .ok_or_else(|| PageError::invalid_state("no query configured"))?;

        let rows = self.fetch_window(query, per_page, page, fetch.as_ref()).await?;
        let total = self.fetch_total(query).await?;

        Ok(P::from_parts(rows, page, per_page, total))
    }

    async fn fetch_window(
        &self,
        query: &str,
        per_page: u64,
        page: u64,
        fetch: Option<&FetchConfig>,
    ) -> Result<Vec<Value>> {
        let windowed = QueryRewriter::windowed_query(query);
        let offset = per_page * (page - 1);

        debug!(
            "Executing windowed query on {}: {}",
            self.executor.executor_type(),
            windowed
        );

        let mut stmt = self.executor.prepare(&windowed).await?;
        for bind in &self.binds {
            stmt.bind_value(&bind.name, bind.value.clone(), bind.param_type);
        }
        stmt.bind_value(OFFSET_PARAM, Value::from(offset), ParamType::Int);
        stmt.bind_value(LIMIT_PARAM, Value::from(per_page), ParamType::Int);

        let rows = stmt.fetch_all(fetch).await?;
        debug!("Windowed query returned {} rows", rows.len());

        Ok(rows)
    }

    async fn fetch_total(&self, query: &str) -> Result<u64> {
        let count = QueryRewriter::count_query(query);

        debug!(
            "Executing count query on {}: {}",
            self.executor.executor_type(),
            count
        );

        let mut stmt = self.executor.prepare(&count).await?;
        for bind in &self.binds {
            stmt.bind_value(&bind.name, bind.value.clone(), bind.param_type);
        }

        let row = stmt
            .fetch_one()
            .await?
            .ok_or_else(|| PageError::data_access("count query returned no rows"))?;

        row.get("total")
            .and_then(Value::as_u64)
            .ok_or_else(|| PageError::data_access("count query returned no 'total' column"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Statement;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// What the next fetch on a mock statement should produce
    enum Scripted {
        Rows(Vec<Value>),
        Fail(&'static str),
    }

    #[derive(Default)]
    struct MockState {
        prepared: Vec<String>,
        binds: Vec<Vec<(String, Value, ParamType)>>,
        scripts: VecDeque<Scripted>,
    }

    /// Scripted in-memory executor recording every prepare and bind
    #[derive(Clone)]
    struct MockExecutor {
        state: Arc<Mutex<MockState>>,
    }

    impl MockExecutor {
        fn new(scripts: Vec<Scripted>) -> Self {
            Self {
                state: Arc::new(Mutex::new(MockState {
                    scripts: scripts.into(),
                    ..MockState::default()
                })),
            }
        }

        fn push_script(&self, script: Scripted) {
            self.state.lock().unwrap().scripts.push_back(script);
        }

        fn prepared(&self) -> Vec<String> {
            self.state.lock().unwrap().prepared.clone()
        }

        fn binds_of(&self, statement: usize) -> Vec<(String, Value, ParamType)> {
            self.state.lock().unwrap().binds[statement].clone()
        }
    }

    struct MockStatement {
        state: Arc<Mutex<MockState>>,
        index: usize,
    }

    #[async_trait]
    impl Executor for MockExecutor {
        fn executor_type(&self) -> &'static str {
            "mock"
        }

        async fn prepare(&self, sql: &str) -> Result<Box<dyn Statement>> {
            let mut state = self.state.lock().unwrap();
            state.prepared.push(sql.to_string());
            state.binds.push(Vec::new());

            Ok(Box::new(MockStatement {
                state: self.state.clone(),
                index: state.prepared.len() - 1,
            }))
        }
    }

    #[async_trait]
    impl Statement for MockStatement {
        fn bind_value(&mut self, name: &str, value: Value, param_type: ParamType) {
            self.state.lock().unwrap().binds[self.index].push((
                name.to_string(),
                value,
                param_type,
            ));
        }

        async fn fetch_all(&mut self, _fetch: Option<&FetchConfig>) -> Result<Vec<Value>> {
            match self.state.lock().unwrap().scripts.pop_front() {
                Some(Scripted::Rows(rows)) => Ok(rows),
                Some(Scripted::Fail(msg)) => Err(PageError::data_access(msg)),
                None => Ok(Vec::new()),
            }
        }

        async fn fetch_one(&mut self) -> Result<Option<Value>> {
            match self.state.lock().unwrap().scripts.pop_front() {
                Some(Scripted::Rows(rows)) => Ok(rows.into_iter().next()),
                Some(Scripted::Fail(msg)) => Err(PageError::data_access(msg)),
                None => Ok(None),
            }
        }
    }

    fn user_rows() -> Vec<Value> {
        vec![
            json!({"id": 1, "name": "Luan", "role": "admin"}),
            json!({"id": 2, "name": "Creidson", "role": "admin"}),
        ]
    }

    #[tokio::test]
    async fn test_execute_runs_windowed_query_then_count_query() {
        let executor = MockExecutor::new(vec![
            Scripted::Rows(user_rows()),
            Scripted::Rows(vec![json!({"total": 5})]),
        ]);
        let mut paginator = Paginator::new(executor.clone());
        paginator.set_query("SELECT * FROM user").unwrap();

        let page: Page = paginator.execute(2, 2, None).await.unwrap();

        assert_eq!(
            executor.prepared(),
            vec![
                "SELECT * FROM user LIMIT :offset, :limit".to_string(),
                "SELECT COUNT(*) AS total FROM user".to_string(),
            ]
        );
        assert_eq!(page.rows().len(), 2);
        assert_eq!(page.total(), 5);
        assert_eq!(page.per_page(), 2);
        assert_eq!(page.current_page(), 2);
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn test_offset_is_computed_from_page_number() {
        let executor = MockExecutor::new(vec![
            Scripted::Rows(Vec::new()),
            Scripted::Rows(vec![json!({"total": 0})]),
        ]);
        let mut paginator = Paginator::new(executor.clone());
        paginator.set_query("SELECT * FROM user").unwrap();

        let _page: Page = paginator.execute(10, 3, None).await.unwrap();

        let window_binds = executor.binds_of(0);
        assert_eq!(
            window_binds,
            vec![
                ("offset".to_string(), json!(20), ParamType::Int),
                ("limit".to_string(), json!(10), ParamType::Int),
            ]
        );
    }

    #[tokio::test]
    async fn test_caller_binds_go_to_both_queries_window_binds_only_to_the_first() {
        let executor = MockExecutor::new(vec![
            Scripted::Rows(user_rows()),
            Scripted::Rows(vec![json!({"total": 3})]),
        ]);
        let mut paginator = Paginator::new(executor.clone());
        paginator
            .set_query("SELECT * FROM user WHERE role = :role")
            .unwrap();
        paginator.bind("role", "admin");

        let _page: Page = paginator.execute(10, 1, None).await.unwrap();

        assert_eq!(
            executor.binds_of(0),
            vec![
                ("role".to_string(), json!("admin"), ParamType::Str),
                ("offset".to_string(), json!(0), ParamType::Int),
                ("limit".to_string(), json!(10), ParamType::Int),
            ]
        );
        assert_eq!(
            executor.binds_of(1),
            vec![("role".to_string(), json!("admin"), ParamType::Str)]
        );
    }

    #[tokio::test]
    async fn test_execute_without_a_query_fails_with_invalid_state() {
        let executor = MockExecutor::new(Vec::new());
        let mut paginator = Paginator::new(executor.clone());

        let result: Result<Page> = paginator.execute(10, 1, None).await;

        assert!(matches!(result, Err(PageError::InvalidState(_))));
        assert!(executor.prepared().is_empty());
    }

    #[tokio::test]
    async fn test_zero_page_geometry_fails_with_invalid_configuration() {
        let executor = MockExecutor::new(Vec::new());
        let mut paginator = Paginator::new(executor.clone());
        paginator.set_query("SELECT * FROM user").unwrap();

        let zero_size: Result<Page> = paginator.execute(0, 1, None).await;
        assert!(matches!(zero_size, Err(PageError::InvalidConfiguration(_))));

        let zero_page: Result<Page> = paginator.execute(10, 0, None).await;
        assert!(matches!(zero_page, Err(PageError::InvalidConfiguration(_))));

        assert!(executor.prepared().is_empty());
    }

    #[tokio::test]
    async fn test_set_query_rejects_a_pre_existing_limit_clause() {
        let executor = MockExecutor::new(Vec::new());
        let mut paginator: Paginator<_> = Paginator::new(executor);

        let result = paginator.set_query("SELECT * FROM user LIMIT 5");

        assert!(matches!(result, Err(PageError::InvalidQuery(_))));
        assert!(paginator.query().is_none());
    }

    #[tokio::test]
    async fn test_set_query_strips_the_trailing_terminator() {
        let executor = MockExecutor::new(Vec::new());
        let mut paginator: Paginator<_> = Paginator::new(executor);

        paginator.set_query("SELECT * FROM user;").unwrap();

        assert_eq!(paginator.query(), Some("SELECT * FROM user"));
    }

    #[tokio::test]
    async fn test_count_query_does_not_run_when_the_windowed_query_fails() {
        let executor = MockExecutor::new(vec![Scripted::Fail("disk I/O error")]);
        let mut paginator = Paginator::new(executor.clone());
        paginator.set_query("SELECT * FROM user").unwrap();

        let result: Result<Page> = paginator.execute(10, 1, None).await;

        assert!(matches!(result, Err(PageError::DataAccess(_))));
        assert_eq!(executor.prepared().len(), 1);
    }

    #[tokio::test]
    async fn test_binds_do_not_leak_into_the_next_execute() {
        let executor = MockExecutor::new(vec![
            Scripted::Rows(user_rows()),
            Scripted::Rows(vec![json!({"total": 3})]),
            Scripted::Rows(Vec::new()),
            Scripted::Rows(vec![json!({"total": 0})]),
        ]);
        let mut paginator = Paginator::new(executor.clone());

        paginator
            .set_query("SELECT * FROM user WHERE role = :role")
            .unwrap();
        paginator.bind("role", "admin");
        let _first: Page = paginator.execute(10, 1, None).await.unwrap();

        paginator.set_query("SELECT * FROM user").unwrap();
        let _second: Page = paginator.execute(10, 1, None).await.unwrap();

        assert_eq!(
            executor.binds_of(2),
            vec![
                ("offset".to_string(), json!(0), ParamType::Int),
                ("limit".to_string(), json!(10), ParamType::Int),
            ]
        );
        assert!(executor.binds_of(3).is_empty());
    }

    #[tokio::test]
    async fn test_binds_are_cleared_even_when_execute_fails() {
        let executor = MockExecutor::new(vec![Scripted::Fail("connection lost")]);
        let mut paginator = Paginator::new(executor.clone());

        paginator
            .set_query("SELECT * FROM user WHERE role = :role")
            .unwrap();
        paginator.bind("role", "admin");
        let failed: Result<Page> = paginator.execute(10, 1, None).await;
        assert!(failed.is_err());

        executor.push_script(Scripted::Rows(Vec::new()));
        executor.push_script(Scripted::Rows(vec![json!({"total": 0})]));
        paginator.set_query("SELECT * FROM user").unwrap();
        let _page: Page = paginator.execute(10, 1, None).await.unwrap();

        // The retried windowed query must carry only the window binds
        assert_eq!(
            executor.binds_of(1),
            vec![
                ("offset".to_string(), json!(0), ParamType::Int),
                ("limit".to_string(), json!(10), ParamType::Int),
            ]
        );
    }

    #[tokio::test]
    async fn test_count_row_without_total_column_is_a_data_access_failure() {
        let executor = MockExecutor::new(vec![
            Scripted::Rows(user_rows()),
            Scripted::Rows(vec![json!({"rows": 5})]),
        ]);
        let mut paginator = Paginator::new(executor);
        paginator.set_query("SELECT * FROM user").unwrap();

        let result: Result<Page> = paginator.execute(10, 1, None).await;

        assert!(matches!(result, Err(PageError::DataAccess(_))));
    }

    #[tokio::test]
    async fn test_count_query_returning_no_rows_is_a_data_access_failure() {
        let executor = MockExecutor::new(vec![
            Scripted::Rows(user_rows()),
            Scripted::Rows(Vec::new()),
        ]);
        let mut paginator = Paginator::new(executor);
        paginator.set_query("SELECT * FROM user").unwrap();

        let result: Result<Page> = paginator.execute(10, 1, None).await;

        assert!(matches!(result, Err(PageError::DataAccess(_))));
    }

    #[tokio::test]
    async fn test_custom_page_type_is_returned_as_that_exact_type() {
        struct RoleSummaryPage {
            rows: Vec<Value>,
            total: u64,
            per_page: u64,
            current_page: u64,
        }

        impl PageCollection for RoleSummaryPage {
            fn from_parts(rows: Vec<Value>, current_page: u64, per_page: u64, total: u64) -> Self {
                Self {
                    rows,
                    total,
                    per_page,
                    current_page,
                }
            }

            fn rows(&self) -> &[Value] {
                &self.rows
            }

            fn total(&self) -> u64 {
                self.total
            }

            fn per_page(&self) -> u64 {
                self.per_page
            }

            fn current_page(&self) -> u64 {
                self.current_page
            }

            fn to_objects(&self) -> Result<Vec<Value>> {
                Ok(self.rows.iter().map(|row| row["role"].clone()).collect())
            }
        }

        let executor = MockExecutor::new(vec![
            Scripted::Rows(user_rows()),
            Scripted::Rows(vec![json!({"total": 2})]),
        ]);
        let mut paginator = Paginator::new(executor).with_page_type::<RoleSummaryPage>();
        paginator.set_query("SELECT * FROM user").unwrap();

        let page = paginator.execute(10, 1, None).await.unwrap();

        assert_eq!(page.total(), 2);
        assert_eq!(
            page.to_objects().unwrap(),
            vec![json!("admin"), json!("admin")]
        );
    }
}
