//! Storage layer for configuration records.
//!
//! Records live in process memory. The layering follows the Repository pattern so handlers
//! never touch the tables directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - per-kind operations)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - stored records)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (db::store - one mutex-guarded table per kind)
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Stored record structures
//! - [`store`]: The in-memory tables
//! - [`errors`]: Storage error types
//!
//! # Locking
//!
//! A repository is built from a locked table and releases it when dropped:
//!
//! ```ignore
//! let mut table = store.models().await;
//! let mut repo = Models::new(&mut table);
//! repo.set_default(&"gpt-4".to_string()).await?;
//! // lock released here
//! ```
//!
//! Never hold a table across slow I/O such as a probe: read what you need, drop the guard,
//! do the I/O, then lock again to record the result.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
