//! # sqlpager
//!
//! Windowed pagination for arbitrary read queries over a pluggable executor.
//!
//! Given a base query, the paginator rewrites it into a bounded ("windowed")
//! fetch plus a companion row-count query, runs both against the data
//! source, and returns a typed page result: rows, current page, page size,
//! total count, total pages.
//!
//! ## Architecture
//!
//! - **QueryRewriter**: pure text transformation of one base query into its
//!   windowed variant (`... LIMIT :offset, :limit`) and its count variant
//!   (`SELECT COUNT(*) AS total FROM ...`, with grouped queries wrapped in
//!   a counting subquery). Light textual rewriting, not SQL parsing.
//! - **Executor / Statement**: the data-source capability the paginator
//!   runs against - prepare, bind by name, materialize rows. Backends
//!   implement these two traits; connections, transactions, and pooling
//!   stay on their side of the seam.
//! - **Paginator**: binds parameters, runs the windowed query, runs the
//!   count query, assembles the page. Two sequential round trips per call,
//!   no caching, no retry.
//! - **Page / PageCollection**: the page-result contract and its default
//!   implementation. Any type implementing [`PageCollection`] can be
//!   produced instead via [`Paginator::with_page_type`].
//!
//! ## Example
//!
//! ```no_run
//! use sqlpager::{Executor, PageCollection, Paginator};
//!
//! # async fn example(executor: impl Executor) -> sqlpager::Result<()> {
//! let mut paginator = Paginator::new(executor);
//! paginator.set_query("SELECT id, name FROM user WHERE role = :role")?;
//! paginator.bind("role", "admin");
//!
//! // Second page, fifteen rows per page
//! let page = paginator.execute(15, 2, None).await?;
//!
//! for row in page.rows() {
//!     println!("{}", row["name"]);
//! }
//! println!("page {} of {}", page.current_page(), page.total_pages());
//! # Ok(())
//! # }
//! ```
//!
//! ## Backend implementation
//!
//! To wire up a new data source:
//!
//! 1. Implement [`Executor`] for a handle to your connection
//! 2. Implement [`Statement`] for its prepared-statement type
//! 3. Map every driver fault into [`PageError::DataAccess`], unmodified
//!
//! Example backend crate: `sqlpager-sqlite`.

pub mod error;
pub mod page;
pub mod paginator;
pub mod rewrite;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{PageError, Result};
pub use page::{Page, PageCollection};
pub use paginator::Paginator;
pub use rewrite::{QueryRewriter, LIMIT_PARAM, OFFSET_PARAM};
pub use traits::{Executor, Statement};
pub use types::{BindParameter, FetchConfig, PageInfo, ParamType};
