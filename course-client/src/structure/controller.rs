//! ReorderController - optimistic mirror of one course outline

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use shared::models::{CourseOutline, DragEvent, ReorderEntry, ScopeRef};
use shared::{ActionResponse, ErrorKind};
use tokio::task::JoinHandle;

use super::drag::{MovePlan, move_item, resolve_drag};
use super::gateway::ReorderGateway;
use super::reducer::{Action, ControllerState, Effect, Outcome, Phase, Ticket, reduce};
use crate::notify::{Notifier, Toast};
use crate::{ClientConfig, ClientError, ClientResult};

/// How concurrent writers to the same scope are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConcurrencyMode {
    /// No version token; the request that lands last wins
    #[default]
    LastWriterWins,
    /// Send the expected scope version; the server rejects stale writes
    Versioned,
}

/// A reorder ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub ticket: Ticket,
    pub scope: ScopeRef,
    pub entries: Vec<ReorderEntry>,
    pub expected_version: Option<u64>,
}

impl Dispatch {
    pub async fn send<G: ReorderGateway + ?Sized>(
        &self,
        gateway: &G,
    ) -> ClientResult<ActionResponse> {
        match &self.scope {
            ScopeRef::Course { course_id } => {
                gateway
                    .reorder_modules(course_id, &self.entries, self.expected_version)
                    .await
            }
            ScopeRef::Module {
                course_id,
                module_id,
            } => {
                gateway
                    .reorder_lessons(module_id, &self.entries, course_id, self.expected_version)
                    .await
            }
        }
    }
}

/// Pre-move order of the scope a ticket touched
#[derive(Debug, Clone)]
struct Snapshot {
    scope: ScopeRef,
    entries: Vec<ReorderEntry>,
}

/// 课程结构编辑器
///
/// Applies drags to a local mirror first, then reconciles with the server
/// response: success keeps the move, failure restores the pre-move order of
/// the affected scope. Further drags are accepted while requests are in flight.
pub struct ReorderController {
    outline: CourseOutline,
    state: ControllerState,
    mode: ConcurrencyMode,
    notifier: Arc<dyn Notifier>,
    next_ticket: u64,
    snapshots: HashMap<Ticket, Snapshot>,
}

impl std::fmt::Debug for ReorderController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderController")
            .field("course_id", &self.outline.course.id)
            .field("state", &self.state)
            .field("mode", &self.mode)
            .finish()
    }
}

impl ReorderController {
    pub fn new(outline: CourseOutline, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            outline,
            state: ControllerState::default(),
            mode: ConcurrencyMode::default(),
            notifier,
            next_ticket: 1,
            snapshots: HashMap::new(),
        }
    }

    pub fn from_config(
        outline: CourseOutline,
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(outline, notifier).with_mode(config.concurrency)
    }

    pub fn with_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    // ========== Accessors ==========

    pub fn outline(&self) -> &CourseOutline {
        &self.outline
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Number of tracked reorders, sent or not
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.len()
    }

    /// Set until [`Self::sync`] once the mirror may differ from the server:
    /// an `InvalidScope` or `StaleScope` failure, a rollback that dropped later
    /// moves of the same scope, or a late success of such a dropped move
    pub fn needs_refetch(&self) -> bool {
        self.state.needs_refetch
    }

    pub fn module_order(&self) -> Vec<String> {
        self.outline.module_ids()
    }

    pub fn lesson_order(&self, module_id: &str) -> Option<Vec<String>> {
        self.outline
            .module(module_id)
            .map(|m| m.lessons.iter().map(|l| l.id.clone()).collect())
    }

    /// Current `{id, position}` list of a scope
    pub fn entries(&self, scope: &ScopeRef) -> Option<Vec<ReorderEntry>> {
        match scope {
            ScopeRef::Course { .. } => Some(
                self.outline
                    .modules
                    .iter()
                    .map(|m| ReorderEntry::new(m.id(), m.module.position))
                    .collect(),
            ),
            ScopeRef::Module { module_id, .. } => self.outline.module(module_id).map(|m| {
                m.lessons
                    .iter()
                    .map(|l| ReorderEntry::new(l.id.clone(), l.position))
                    .collect()
            }),
        }
    }

    // ========== Drivers ==========

    /// Optimistic step of a drop
    ///
    /// Returns the request to send, or `None` when the drop changes nothing
    /// or cannot be resolved (the latter raises an error toast). The
    /// controller stays `Reordering` until [`Self::mark_dispatched`].
    pub fn drag_end(&mut self, event: &DragEvent) -> Option<Dispatch> {
        let plan = match resolve_drag(&self.outline, event) {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                tracing::trace!(active = %event.active.id, "Drop changes nothing");
                return None;
            }
            Err(e) => {
                tracing::warn!(active = %event.active.id, error = %e, "Drop rejected");
                self.notifier.notify(Toast::error(e.to_string()));
                return None;
            }
        };

        let before = self.entries(&plan.scope)?;
        self.apply_move(&plan);
        let entries = self.entries(&plan.scope)?;

        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let expected_version = self.expected_version(&plan.scope);

        self.snapshots.insert(
            ticket,
            Snapshot {
                scope: plan.scope.clone(),
                entries: before,
            },
        );
        self.apply(Action::DragEnded {
            ticket,
            scope: plan.scope.clone(),
        });

        tracing::debug!(
            ticket = %ticket,
            scope = %plan.scope,
            from = plan.from,
            to = plan.to,
            "Optimistic reorder applied"
        );
        self.notifier.notify(Toast::loading(format!(
            "Reordering {}...",
            plan.scope.children_noun()
        )));

        Some(Dispatch {
            ticket,
            scope: plan.scope,
            entries,
            expected_version,
        })
    }

    /// The request for `ticket` is on its way
    pub fn mark_dispatched(&mut self, ticket: Ticket) {
        self.apply(Action::Dispatched { ticket });
    }

    /// Reconcile a response
    ///
    /// An error envelope (`status: "error"`) fails like a transport error.
    /// Returns `None` when the ticket is no longer tracked (dropped after an
    /// earlier failure or superseded by a sync); the mirror is left alone,
    /// but a late success still marks the outline for refetch.
    pub fn settle(&mut self, ticket: Ticket, result: ClientResult<ActionResponse>) -> Option<Outcome> {
        let (outcome, ack, error) = match result {
            Ok(ack) if ack.is_success() => (Outcome::Confirmed, Some(ack), None),
            Ok(ack) => {
                let kind = ack.kind.unwrap_or(ErrorKind::StorageFailure);
                (
                    Outcome::Failed(kind),
                    None,
                    Some(ClientError::action(kind, ack.message)),
                )
            }
            Err(e) => (Outcome::Failed(e.kind()), None, Some(e)),
        };

        let tracked = self.state.in_flight.contains_key(&ticket);
        if !tracked {
            tracing::debug!(ticket = %ticket, outcome = ?outcome, "Result of untracked reorder");
        }

        for effect in self.apply(Action::Settled {
            ticket,
            outcome: outcome.clone(),
        }) {
            match effect {
                Effect::Commit(t) => {
                    let Some(snapshot) = self.snapshots.remove(&t) else {
                        continue;
                    };
                    if let Some(ack) = &ack {
                        if let Some(version) = ack.version {
                            self.observe_version(&snapshot.scope, version);
                        }
                        tracing::info!(ticket = %t, scope = %snapshot.scope, "Reorder confirmed");
                        self.notifier.notify(Toast::success(ack.message.clone()));
                    }
                }
                Effect::Rollback(t) => {
                    let Some(snapshot) = self.snapshots.remove(&t) else {
                        continue;
                    };
                    self.restore(&snapshot);
                    tracing::warn!(
                        ticket = %t,
                        scope = %snapshot.scope,
                        error = ?error,
                        "Reorder failed, rolled back"
                    );
                    self.notifier.notify(Toast::error(format!(
                        "Failed to reorder {}.",
                        snapshot.scope.children_noun()
                    )));
                }
                Effect::Discard(tickets) => {
                    for t in tickets {
                        self.snapshots.remove(&t);
                    }
                }
                Effect::Refetch => {
                    tracing::info!(course_id = %self.outline.course.id, "Outline marked for refetch");
                }
            }
        }

        tracked.then_some(outcome)
    }

    /// Replace the mirror with a fresh server outline
    pub fn sync(&mut self, outline: CourseOutline) {
        self.outline = outline;
        for effect in self.apply(Action::Synced) {
            if let Effect::Discard(tickets) = effect {
                tracing::debug!(count = tickets.len(), "Forgetting in-flight reorders after sync");
            }
        }
        self.snapshots.clear();
    }

    /// `drag_end`, send, `settle` in sequence
    pub async fn drag_end_and_persist<G: ReorderGateway + ?Sized>(
        &mut self,
        event: &DragEvent,
        gateway: &G,
    ) -> Option<Outcome> {
        let dispatch = self.drag_end(event)?;
        self.mark_dispatched(dispatch.ticket);
        let result = dispatch.send(gateway).await;
        self.settle(dispatch.ticket, result)
    }

    // ========== Internals ==========

    fn apply(&mut self, action: Action) -> Vec<Effect> {
        let (state, effects) = reduce(std::mem::take(&mut self.state), action);
        self.state = state;
        effects
    }

    fn apply_move(&mut self, plan: &MovePlan) {
        match &plan.scope {
            ScopeRef::Course { .. } => {
                let modules = &mut self.outline.modules;
                move_item(modules, plan.from, plan.to);
                for (index, module) in modules.iter_mut().enumerate() {
                    module.module.position = index as u32 + 1;
                }
            }
            ScopeRef::Module { module_id, .. } => {
                if let Some(module) = self.outline.module_mut(module_id) {
                    move_item(&mut module.lessons, plan.from, plan.to);
                    for (index, lesson) in module.lessons.iter_mut().enumerate() {
                        lesson.position = index as u32 + 1;
                    }
                }
            }
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) {
        let position_of = |id: &str| {
            snapshot
                .entries
                .iter()
                .find(|e| e.id == id)
                .map(|e| e.position)
        };
        match &snapshot.scope {
            ScopeRef::Course { .. } => {
                for module in &mut self.outline.modules {
                    if let Some(position) = position_of(&module.module.id) {
                        module.module.position = position;
                    }
                }
                self.outline.modules.sort_by_key(|m| m.module.position);
            }
            ScopeRef::Module { module_id, .. } => {
                if let Some(module) = self.outline.module_mut(module_id) {
                    for lesson in &mut module.lessons {
                        if let Some(position) = position_of(&lesson.id) {
                            lesson.position = position;
                        }
                    }
                    module.lessons.sort_by_key(|l| l.position);
                }
            }
        }
    }

    /// Version the server should hold when this request lands
    ///
    /// Every committed reorder bumps the scope version by one, so requests
    /// already in flight for the scope are counted ahead of this one.
    fn expected_version(&self, scope: &ScopeRef) -> Option<u64> {
        if self.mode == ConcurrencyMode::LastWriterWins {
            return None;
        }
        let observed = match scope {
            ScopeRef::Course { .. } => self.outline.modules_version,
            ScopeRef::Module { module_id, .. } => self.outline.module(module_id)?.lessons_version,
        };
        let ahead = self.state.in_flight.values().filter(|s| *s == scope).count() as u64;
        Some(observed + ahead)
    }

    fn observe_version(&mut self, scope: &ScopeRef, version: u64) {
        match scope {
            ScopeRef::Course { .. } => {
                self.outline.modules_version = self.outline.modules_version.max(version);
            }
            ScopeRef::Module { module_id, .. } => {
                if let Some(module) = self.outline.module_mut(module_id) {
                    module.lessons_version = module.lessons_version.max(version);
                }
            }
        }
    }
}

/// Controller shared between the UI thread and response tasks
#[derive(Debug, Clone)]
pub struct SharedController {
    inner: Arc<Mutex<ReorderController>>,
}

impl SharedController {
    pub fn new(controller: ReorderController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ReorderController> {
        self.inner.lock()
    }

    pub fn downgrade(&self) -> Weak<Mutex<ReorderController>> {
        Arc::downgrade(&self.inner)
    }

    /// Apply a drop now and send it on a background task
    ///
    /// The task only holds a weak reference: if every `SharedController` is
    /// dropped before the response arrives, the result is discarded. The
    /// request itself is not cancelled.
    pub fn spawn_drag_end(
        &self,
        event: &DragEvent,
        gateway: Arc<dyn ReorderGateway>,
    ) -> Option<JoinHandle<Option<Outcome>>> {
        let dispatch = {
            let mut controller = self.inner.lock();
            let dispatch = controller.drag_end(event)?;
            controller.mark_dispatched(dispatch.ticket);
            dispatch
        };
        let weak = self.downgrade();

        Some(tokio::spawn(async move {
            let result = dispatch.send(gateway.as_ref()).await;
            match weak.upgrade() {
                Some(inner) => inner.lock().settle(dispatch.ticket, result),
                None => {
                    tracing::debug!(
                        ticket = %dispatch.ticket,
                        "Controller dropped before reorder settled"
                    );
                    None
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{RecordingNotifier, ToastPhase};
    use crate::structure::testing::{MockGateway, outline};
    use crate::ClientError;
    use shared::models::DragItem;
    use shared::ErrorKind;
    use tokio::sync::Notify;

    fn controller(outline: CourseOutline) -> (ReorderController, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        (ReorderController::new(outline, notifier.clone()), notifier)
    }

    fn positions(controller: &ReorderController) -> Vec<(String, u32)> {
        controller
            .outline()
            .modules
            .iter()
            .map(|m| (m.id().to_string(), m.module.position))
            .collect()
    }

    fn drop_module(active: &str, over: &str) -> DragEvent {
        DragEvent::new(DragItem::module(active), Some(DragItem::module(over)))
    }

    #[test]
    fn test_move_renumbers_whole_scope() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &[]), ("B", &[]), ("C", &[]), ("D", &[])]));

        let dispatch = ctrl.drag_end(&drop_module("A", "C")).unwrap();

        assert_eq!(ctrl.module_order(), vec!["B", "C", "A", "D"]);
        assert_eq!(
            dispatch.entries,
            ReorderEntry::from_ids(["B", "C", "A", "D"])
        );
        assert_eq!(dispatch.scope, ScopeRef::course("course-1"));
        assert_eq!(dispatch.expected_version, None);
        assert_eq!(ctrl.phase(), Phase::Reordering);
        assert_eq!(notifier.last(), Some(Toast::loading("Reordering modules...")));

        ctrl.mark_dispatched(dispatch.ticket);
        assert_eq!(ctrl.phase(), Phase::Reconciling);
    }

    #[test]
    fn test_failure_rolls_back() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &[]), ("B", &[]), ("C", &[])]));

        let dispatch = ctrl.drag_end(&drop_module("B", "A")).unwrap();
        assert_eq!(ctrl.module_order(), vec!["B", "A", "C"]);

        let outcome = ctrl.settle(
            dispatch.ticket,
            Err(ClientError::action(ErrorKind::StorageFailure, "Failed to reorder modules")),
        );

        assert_eq!(outcome, Some(Outcome::Failed(ErrorKind::StorageFailure)));
        assert_eq!(
            positions(&ctrl),
            vec![("A".into(), 1), ("B".into(), 2), ("C".into(), 3)]
        );
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(!ctrl.needs_refetch());
        assert_eq!(notifier.last(), Some(Toast::error("Failed to reorder modules.")));
    }

    #[test]
    fn test_error_envelope_rolls_back() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &[]), ("B", &[]), ("C", &[])]));

        let dispatch = ctrl.drag_end(&drop_module("B", "A")).unwrap();
        ctrl.mark_dispatched(dispatch.ticket);
        let outcome = ctrl.settle(
            dispatch.ticket,
            Ok(ActionResponse::error(ErrorKind::StorageFailure, "Failed to reorder modules")),
        );

        assert_eq!(outcome, Some(Outcome::Failed(ErrorKind::StorageFailure)));
        assert_eq!(ctrl.module_order(), vec!["A", "B", "C"]);
        assert_eq!(ctrl.phase(), Phase::Idle);
        let last = notifier.last().unwrap();
        assert_eq!(last.phase, ToastPhase::Error);
        assert_eq!(last.message, "Failed to reorder modules.");
    }

    #[test]
    fn test_error_envelope_keeps_its_kind() {
        let (mut ctrl, _) = controller(outline(&[("A", &["a1", "a2"])]));

        let event = DragEvent::new(DragItem::lesson("a2", "A"), Some(DragItem::lesson("a1", "A")));
        let dispatch = ctrl.drag_end(&event).unwrap();
        let mut rejected = ActionResponse::success("Failed to reorder lessons");
        rejected.status = shared::ActionStatus::Error;
        rejected.kind = Some(ErrorKind::InvalidScope);

        assert_eq!(
            ctrl.settle(dispatch.ticket, Ok(rejected)),
            Some(Outcome::Failed(ErrorKind::InvalidScope))
        );
        assert_eq!(ctrl.lesson_order("A").unwrap(), vec!["a1", "a2"]);
        assert!(ctrl.needs_refetch());
    }

    #[test]
    fn test_success_keeps_order_and_records_version() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &[]), ("B", &[])]));

        let dispatch = ctrl.drag_end(&drop_module("B", "A")).unwrap();
        ctrl.settle(
            dispatch.ticket,
            Ok(ActionResponse::success("Modules reordered successfully").with_version(4)),
        );

        assert_eq!(ctrl.module_order(), vec!["B", "A"]);
        assert_eq!(ctrl.outline().modules_version, 4);
        assert_eq!(ctrl.in_flight(), 0);
        assert_eq!(
            notifier.last(),
            Some(Toast::success("Modules reordered successfully"))
        );
    }

    #[test]
    fn test_self_drop_and_no_target_change_nothing() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &["a1", "a2"]), ("B", &[])]));
        let before = ctrl.outline().clone();

        assert!(ctrl.drag_end(&drop_module("A", "A")).is_none());
        assert!(ctrl.drag_end(&DragEvent::new(DragItem::lesson("a1", "A"), None)).is_none());

        assert_eq!(ctrl.outline(), &before);
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_cross_module_lesson_sends_nothing() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &["a1"]), ("B", &["b1"])]));
        let before = ctrl.outline().clone();
        let gateway = MockGateway::new();

        let event = DragEvent::new(DragItem::lesson("a1", "A"), Some(DragItem::lesson("b1", "B")));
        let outcome = ctrl.drag_end_and_persist(&event, &gateway).await;

        assert_eq!(outcome, None);
        assert!(gateway.calls().is_empty());
        assert_eq!(ctrl.outline(), &before);
        assert_eq!(notifier.errors().len(), 1);
        assert_eq!(notifier.errors()[0].phase, ToastPhase::Error);
    }

    #[tokio::test]
    async fn test_lesson_onto_module_header_is_noop() {
        let (mut ctrl, notifier) = controller(outline(&[("A", &["a1"]), ("B", &["b1"])]));
        let gateway = MockGateway::new();

        let event = DragEvent::new(DragItem::lesson("a1", "A"), Some(DragItem::module("B")));
        assert_eq!(ctrl.drag_end_and_persist(&event, &gateway).await, None);

        assert!(gateway.calls().is_empty());
        assert!(notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_lesson_reorder_hits_lesson_scope_only() {
        let (mut ctrl, _) = controller(outline(&[("A", &["a1", "a2", "a3"]), ("B", &["b1"])]));
        let gateway = MockGateway::new();

        let event = DragEvent::new(DragItem::lesson("a3", "A"), Some(DragItem::lesson("a1", "A")));
        let outcome = ctrl.drag_end_and_persist(&event, &gateway).await;

        assert_eq!(outcome, Some(Outcome::Confirmed));
        assert_eq!(ctrl.lesson_order("A").unwrap(), vec!["a3", "a1", "a2"]);
        assert_eq!(ctrl.module_order(), vec!["A", "B"]);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].scope, ScopeRef::module("course-1", "A"));
        assert_eq!(calls[0].entries, ReorderEntry::from_ids(["a3", "a1", "a2"]));
    }

    #[tokio::test]
    async fn test_rollback_with_later_move_in_flight_flags_refetch() {
        let (mut ctrl, _) = controller(outline(&[("A", &[]), ("B", &[]), ("C", &[])]));
        let gateway = MockGateway::new();
        gateway.fail_next(ErrorKind::StorageFailure);

        let first = ctrl.drag_end(&drop_module("C", "A")).unwrap();
        ctrl.mark_dispatched(first.ticket);
        let second = ctrl.drag_end(&drop_module("B", "A")).unwrap();
        ctrl.mark_dispatched(second.ticket);
        assert_eq!(ctrl.module_order(), vec!["C", "B", "A"]);
        assert_eq!(ctrl.in_flight(), 2);

        let first_result = first.send(&gateway).await;
        let second_result = second.send(&gateway).await;

        ctrl.settle(first.ticket, first_result);
        assert_eq!(ctrl.module_order(), vec!["A", "B", "C"]);
        assert_eq!(ctrl.in_flight(), 0);
        assert!(ctrl.needs_refetch());

        // The dropped move still committed server side: the mirror is not
        // patched, and the outline stays marked until a sync
        assert_eq!(ctrl.settle(second.ticket, second_result), None);
        assert_eq!(ctrl.module_order(), vec!["A", "B", "C"]);
        assert!(ctrl.needs_refetch());
        assert_eq!(gateway.calls()[1].entries, ReorderEntry::from_ids(["C", "B", "A"]));

        ctrl.sync(outline(&[("C", &[]), ("B", &[]), ("A", &[])]));
        assert!(!ctrl.needs_refetch());
        assert_eq!(ctrl.module_order(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_late_success_after_sync_flags_refetch() {
        let (mut ctrl, _) = controller(outline(&[("A", &[]), ("B", &[])]));

        let dispatch = ctrl.drag_end(&drop_module("B", "A")).unwrap();
        ctrl.mark_dispatched(dispatch.ticket);
        ctrl.sync(outline(&[("A", &[]), ("B", &[])]));
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(!ctrl.needs_refetch());

        let late = ctrl.settle(
            dispatch.ticket,
            Ok(ActionResponse::success("Modules reordered successfully")),
        );
        assert_eq!(late, None);
        assert_eq!(ctrl.module_order(), vec!["A", "B"]);
        assert!(ctrl.needs_refetch());
    }

    #[test]
    fn test_scope_failure_flags_refetch_until_sync() {
        let (mut ctrl, _) = controller(outline(&[("A", &["a1", "a2"])]));

        let event = DragEvent::new(DragItem::lesson("a2", "A"), Some(DragItem::lesson("a1", "A")));
        let dispatch = ctrl.drag_end(&event).unwrap();
        ctrl.settle(
            dispatch.ticket,
            Err(ClientError::action(ErrorKind::InvalidScope, "Failed to reorder lessons")),
        );

        assert!(ctrl.needs_refetch());
        assert_eq!(ctrl.lesson_order("A").unwrap(), vec!["a1", "a2"]);

        let mut fresh = outline(&[("A", &["a2", "a1"])]);
        fresh.modules[0].lessons_version = 3;
        ctrl.sync(fresh);
        assert!(!ctrl.needs_refetch());
        assert_eq!(ctrl.lesson_order("A").unwrap(), vec!["a2", "a1"]);
    }

    #[test]
    fn test_versioned_mode_counts_in_flight_requests() {
        let mut fixture = outline(&[("A", &[]), ("B", &[]), ("C", &[])]);
        fixture.modules_version = 5;
        let (ctrl, _) = controller(fixture);
        let mut ctrl = ctrl.with_mode(ConcurrencyMode::Versioned);

        let first = ctrl.drag_end(&drop_module("C", "A")).unwrap();
        let second = ctrl.drag_end(&drop_module("B", "A")).unwrap();
        assert_eq!(first.expected_version, Some(5));
        assert_eq!(second.expected_version, Some(6));

        ctrl.settle(first.ticket, Ok(ActionResponse::success("ok").with_version(6)));
        let third = ctrl.drag_end(&drop_module("A", "C")).unwrap();
        assert_eq!(third.expected_version, Some(7));
    }

    #[tokio::test]
    async fn test_spawned_drag_settles_through_weak_reference() {
        let (ctrl, _) = controller(outline(&[("A", &[]), ("B", &[])]));
        let shared = SharedController::new(ctrl);
        let gateway = Arc::new(MockGateway::new());

        let handle = shared
            .spawn_drag_end(&drop_module("B", "A"), gateway.clone())
            .unwrap();
        assert_eq!(handle.await.unwrap(), Some(Outcome::Confirmed));
        assert_eq!(shared.lock().module_order(), vec!["B", "A"]);
        assert_eq!(shared.lock().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_spawned_failure_rolls_back() {
        let (ctrl, notifier) = controller(outline(&[("A", &[]), ("B", &[]), ("C", &[])]));
        let shared = SharedController::new(ctrl);
        let gateway = Arc::new(MockGateway::new());
        gateway.fail_next(ErrorKind::StaleScope);

        let handle = shared
            .spawn_drag_end(&drop_module("C", "A"), gateway.clone())
            .unwrap();
        assert_eq!(shared.lock().module_order(), vec!["C", "A", "B"]);

        assert_eq!(
            handle.await.unwrap(),
            Some(Outcome::Failed(ErrorKind::StaleScope))
        );
        let ctrl = shared.lock();
        assert_eq!(ctrl.module_order(), vec!["A", "B", "C"]);
        assert!(ctrl.needs_refetch());
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_result_discarded_after_controller_dropped() {
        let (ctrl, _) = controller(outline(&[("A", &[]), ("B", &[])]));
        let shared = SharedController::new(ctrl);
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::gated(gate.clone()));

        let handle = shared
            .spawn_drag_end(&drop_module("B", "A"), gateway.clone())
            .unwrap();
        let weak = shared.downgrade();
        drop(shared);
        assert!(weak.upgrade().is_none());

        gate.notify_one();
        assert_eq!(handle.await.unwrap(), None);
        assert_eq!(gateway.calls().len(), 1);
    }
}
