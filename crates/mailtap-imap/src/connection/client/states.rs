//! Type-state markers.
//!
//! Each marker unlocks the commands valid in that protocol state. The
//! [`Authed`] trait groups the states that follow a successful LOGIN.

/// Connected, greeting read, not yet logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// Logged in with a mailbox selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selected;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Authenticated {}
    impl Sealed for super::Selected {}
}

/// States in which mailbox commands (LIST, SELECT, EXAMINE) are allowed.
pub trait Authed: sealed::Sealed {}

impl Authed for Authenticated {}
impl Authed for Selected {}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn _assert_send_sync<T: Send + Sync>() {}
    fn _assert_authed<T: Authed>() {}

    #[test]
    fn test_markers() {
        _assert_send_sync::<NotAuthenticated>();
        _assert_send_sync::<Authenticated>();
        _assert_send_sync::<Selected>();
        _assert_authed::<Authenticated>();
        _assert_authed::<Selected>();
    }
}
