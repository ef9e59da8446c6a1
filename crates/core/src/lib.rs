//! `intraportal-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod kind;
pub mod pagination;

pub use entity::Entity;
pub use error::{ensure, DomainError, DomainResult};
pub use id::{CommentId, ContentId, DepartmentId, EventId, UserId};
pub use kind::{AnnouncementScope, ContentKind};
pub use pagination::{Page, PageRequest, Window};
