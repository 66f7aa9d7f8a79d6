//! Badge Feed Module
//!
//! The sidebar's badges carry pending-work counts (open ferry requests,
//! visa applications awaiting review, top-up requests). Upstream jobs push
//! counts here over HTTP; entries live in memory with a TTL so a feed that
//! goes quiet fades out instead of showing stale numbers forever.
//!
//! # Usage
//!
//! ```rust,ignore
//! use waypost::badge;
//!
//! let app = Router::new()
//!     .nest("/api", badge::routes())
//!     .with_state(app_state);
//! ```

mod handler;
mod routes;

pub use handler::{BadgeBoard, BadgeEntry, BadgePush};
pub use routes::routes;
