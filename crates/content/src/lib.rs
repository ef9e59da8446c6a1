//! `intraportal-content`: content items, moderation and listing rules.
//!
//! Everything here is pure: storage and HTTP live in `intraportal-infra`
//! and `intraportal-api`.

pub mod comment;
pub mod department;
pub mod event;
pub mod filter;
pub mod item;
pub mod moderation;
pub mod receipts;
pub mod search;

pub use comment::{can_comment, can_view_comments, ReviewComment};
pub use department::{ensure_deletable, Department, DepartmentPatch, DepartmentSummary, NewDepartment};
pub use event::{participation, Event, EventFilter, EventParticipant, EventPatch, EventVisibility, NewEvent, ParticipantStatus};
pub use filter::{
    access_overlay, build_predicate, combined_windows, merge_newest_first, moderation_queue, newest_first,
    ContentQuery, ContentTypeFilter, Predicate,
};
pub use item::{Attachment, ContentItem, ContentPatch, NewContent};
pub use moderation::{decide, resubmit, Decision, ModerationAction, ModerationCommand, ModerationStatus, Review};
pub use receipts::{check_target, tracks_receipts, ReadOutcome, ReadReceipt};
pub use search::{SearchRequest, SearchResults, SearchTarget};
