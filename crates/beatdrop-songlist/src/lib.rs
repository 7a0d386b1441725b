//! Song list controller: reconciles raw song records from the catalog and
//! the local download cache into one canonical view, drives pagination, and
//! resolves per-song actions.
//!
//! The controller is synchronous and owns its [`session::ListSession`].
//! Events go in, [`controller::Effect`]s come out; the async
//! [`runtime::SongListRuntime`] carries effects to the collaborators and
//! feeds their completions back in as events.

pub mod actions;
pub mod controller;
pub mod downloaded;
pub mod error;
pub mod highlight;
pub mod identity;
pub mod normalize;
pub mod pagination;
pub mod record;
pub mod render_key;
pub mod runtime;
pub mod session;
pub mod view;
pub mod viewport;

pub use controller::{Effect, ListEvent, SongListController};
pub use error::SongListError;
pub use normalize::SongView;
pub use record::RawSongRecord;
