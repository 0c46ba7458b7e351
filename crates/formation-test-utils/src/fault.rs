//! [`FaultyTransport`] wraps any transport and fails selected calls.

use formation_core::{AccessType, Entity, EntityHandle, Transport, TransportError, TransportResult};
use serde_json::Value;

/// Transport operation selector for fault rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Store,
    Get,
    FindEntityId,
    GetTeam,
    GetWiki,
    GetEvaluation,
    SetPermissions,
    InviteToTeam,
    RestGet,
    RestPost,
}

struct Rule {
    kind: CallKind,
    /// Zero-based index of the matching call that fails
    nth: usize,
    error: TransportError,
}

/// A transport that forwards to `inner` except for the calls its rules
/// select, which fail with the configured error without reaching `inner`.
///
/// # Example
///
/// ```rust
/// use formation_core::{LocalPlatform, TransportError};
/// use formation_test_utils::{CallKind, FaultyTransport};
///
/// let transport = FaultyTransport::new(LocalPlatform::new())
///     .fail_nth(CallKind::SetPermissions, 1, TransportError::http(403, "denied"));
/// ```
pub struct FaultyTransport<T> {
    inner: T,
    rules: Vec<Rule>,
    seen: Vec<(CallKind, usize)>,
}

impl<T: Transport> FaultyTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rules: Vec::new(),
            seen: Vec::new(),
        }
    }

    /// Fail the `nth` (zero-based) call of `kind`.
    pub fn fail_nth(mut self, kind: CallKind, nth: usize, error: TransportError) -> Self {
        self.rules.push(Rule { kind, nth, error });
        self
    }

    /// Fail the first call of `kind`.
    pub fn fail_first(self, kind: CallKind, error: TransportError) -> Self {
        self.fail_nth(kind, 0, error)
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Number of calls of `kind` seen so far, failed ones included.
    pub fn count(&self, kind: CallKind) -> usize {
        self.seen
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    fn check(&mut self, kind: CallKind) -> TransportResult<()> {
        let index = self.count(kind);
        match self.seen.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => self.seen.push((kind, 1)),
        }
        match self.rules.iter().find(|r| r.kind == kind && r.nth == index) {
            Some(rule) => Err(rule.error.clone()),
            None => Ok(()),
        }
    }
}

impl<T: Transport> Transport for FaultyTransport<T> {
    fn store(&mut self, entity: &Entity, create_or_update: bool) -> TransportResult<EntityHandle> {
        self.check(CallKind::Store)?;
        self.inner.store(entity, create_or_update)
    }

    fn get(&mut self, id: &str, download_file: bool) -> TransportResult<EntityHandle> {
        self.check(CallKind::Get)?;
        self.inner.get(id, download_file)
    }

    fn find_entity_id(&mut self, name: &str, parent: Option<&str>) -> TransportResult<Option<String>> {
        self.check(CallKind::FindEntityId)?;
        self.inner.find_entity_id(name, parent)
    }

    fn get_team(&mut self, name: &str) -> TransportResult<EntityHandle> {
        self.check(CallKind::GetTeam)?;
        self.inner.get_team(name)
    }

    fn get_wiki(&mut self, owner_id: &str) -> TransportResult<EntityHandle> {
        self.check(CallKind::GetWiki)?;
        self.inner.get_wiki(owner_id)
    }

    fn get_evaluation_by_name(&mut self, name: &str) -> TransportResult<EntityHandle> {
        self.check(CallKind::GetEvaluation)?;
        self.inner.get_evaluation_by_name(name)
    }

    fn set_permissions(
        &mut self,
        entity: &EntityHandle,
        principal_id: &str,
        access_type: &[AccessType],
    ) -> TransportResult<()> {
        self.check(CallKind::SetPermissions)?;
        self.inner.set_permissions(entity, principal_id, access_type)
    }

    fn invite_to_team(
        &mut self,
        team: &EntityHandle,
        user: Option<&str>,
        invitee_email: Option<&str>,
        message: &str,
    ) -> TransportResult<()> {
        self.check(CallKind::InviteToTeam)?;
        self.inner.invite_to_team(team, user, invitee_email, message)
    }

    fn rest_get(&mut self, path: &str) -> TransportResult<Value> {
        self.check(CallKind::RestGet)?;
        self.inner.rest_get(path)
    }

    fn rest_post(&mut self, path: &str, body: &Value) -> TransportResult<Value> {
        self.check(CallKind::RestPost)?;
        self.inner.rest_post(path, body)
    }
}
