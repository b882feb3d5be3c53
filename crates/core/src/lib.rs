//! Core library: note files, hard-link tags, identity index and the host command channel.

pub mod channel;
pub mod config;
pub mod error;
pub mod home;
pub mod identity;
pub mod layout;
pub mod models;
pub mod notes;
pub mod tag_index;
pub mod tagging;

pub use error::{HomeError, HomeResult};
pub use identity::FileId;
pub use layout::HomeLayout;
