//! Building blocks shared by the back office list views: query parameters for
//! search/filter/sort/paging, envelope decoding, and numbered pagination.
//! Entity-specific views (subscriptions, clients, tickets, ...) compose these with
//! [`crate::client::ApiClient`]; none of them live here.

mod envelope;
mod list;
mod pagination;

pub use envelope::Envelope;
pub use list::{total_pages, ListQuery, PageMeta, SortOrder, DEFAULT_PAGE_SIZE};
pub use pagination::{page_window, render_window, PageSlot};
