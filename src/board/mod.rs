//! Board: bugs, lanes and tasks over REST.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐   HTTP   ┌──────────────────────────────────────────────────┐
//! │  Client  │ ───────> │  server.rs  (build_router, start_server)         │
//! │          │ <─────── │    └─ api.rs  (api_router, AppState, ApiError)   │
//! └──────────┘   JSON   │         │                                        │
//!                       │         │ bugs.rs / lanes.rs / tasks.rs          │
//!                       │         v                                        │
//!                       │  repo.rs  (Repo<R>, per-request timeout)         │
//!                       │         │                                        │
//!                       │         v                                        │
//!                       │  store.rs  (DocumentStore trait, MongoStore)     │
//!                       │  memory.rs (MemoryStore)                         │
//!                       └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module   | Responsibility                                           |
//! |----------|----------------------------------------------------------|
//! | `models` | `Bug`, `Lane`, `Task`, create payloads and patch bodies  |
//! | `query`  | Collection names, field names, `Filter`, `Update`        |
//!
//! ## Typical Request Flow (update a task)
//!
//! 1. `PATCH /api/v1/tasks/{id}` → `tasks::update_task()`
//! 2. The id is parsed as an ObjectId (`400 Invalid ID` otherwise) and the
//!    body into a `TaskPatch` (`400 Invalid Input` otherwise).
//! 3. `TaskPatch::into_update()` keeps only the supplied fields and stamps
//!    `updated_at`; nothing supplied means `400 No fields to update`.
//! 4. `Repo::<Task>::update()` runs `update_one` then `find_one` within the
//!    request timeout and returns the fresh document, or `404` when no
//!    document matched.

pub mod api;
pub mod bugs;
pub mod lanes;
pub mod memory;
pub mod models;
pub mod query;
pub mod repo;
pub mod server;
pub mod store;
pub mod tasks;
