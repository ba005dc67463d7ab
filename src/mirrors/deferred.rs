//! One-shot tasks delayed after the creation of a mirror's secondary view.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use bevy_app::prelude::*;
use bevy_camera::visibility::Visibility;
use bevy_ecs::prelude::*;
use bevy_time::{Time, Timer, TimerMode};
use tracing::{debug, trace};

use super::*;

/// Add the deferred task logic to [MirrorsPlugin]
pub(super) fn build_deferred(app: &mut App) {
    app.init_resource::<DeferredMirrorTasks>().add_systems(
        PostUpdate,
        run_deferred_tasks
            .in_set(MirrorSystems::Lifecycle)
            .after(create_secondary_views),
    );
}

/// Shared flag telling a pending task it should not run.
///
/// Atomic since the guard holding it is a component, which must be `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// [Component] tying the tasks scheduled for an entity to its lifetime:
/// dropping it (despawning the entity, or replacing the guard) cancels them.
#[derive(Component, Debug)]
pub struct MirrorTaskGuard {
    token: CancellationToken,
}

impl MirrorTaskGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for MirrorTaskGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Stop rendering the mirror's original (unreflected) representation.
    HideOriginal,
}

#[derive(Debug)]
struct DeferredTask {
    target: Entity,
    action: DeferredAction,
    timer: Timer,
    token: CancellationToken,
}

/// [Resource] with the pending one-shot tasks, ticked by [run_deferred_tasks].
#[derive(Resource, Debug, Default)]
pub struct DeferredMirrorTasks {
    tasks: Vec<DeferredTask>,
}

impl DeferredMirrorTasks {
    /// Schedules `action` on `target` after `delay`, the returned guard must be
    /// inserted on `target`.
    pub fn schedule(&mut self, target: Entity, delay: Duration, action: DeferredAction) -> MirrorTaskGuard {
        let token = CancellationToken::new();
        self.tasks.push(DeferredTask {
            target,
            action,
            timer: Timer::new(delay, TimerMode::Once),
            token: token.clone(),
        });
        MirrorTaskGuard { token }
    }

    /// Advances the timers, returns the actions due this frame.
    ///
    /// Fired and cancelled tasks are removed.
    pub fn advance(&mut self, delta: Duration) -> Vec<(Entity, DeferredAction)> {
        let mut due = Vec::new();
        self.tasks.retain_mut(|task| {
            if task.token.is_cancelled() {
                trace!("Deferred {:?} of {} cancelled", task.action, task.target);
                return false;
            }
            if task.timer.tick(delta).just_finished() {
                due.push((task.target, task.action));
                return false;
            }
            true
        });
        due
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// [System] running the deferred tasks that are due.
pub fn run_deferred_tasks(
    mut commands: Commands,
    time: Res<Time>,
    mut tasks: ResMut<DeferredMirrorTasks>,
) {
    for (target, action) in tasks.advance(time.delta()) {
        let Ok(mut entity_commands) = commands.get_entity(target) else {
            debug!("Deferred {action:?} skipped, mirror {target} is gone");
            continue;
        };
        match action {
            DeferredAction::HideOriginal => {
                entity_commands.try_insert(Visibility::Hidden);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_the_delay() {
        let mut tasks = DeferredMirrorTasks::default();
        let _guard = tasks.schedule(
            Entity::PLACEHOLDER,
            Duration::from_millis(100),
            DeferredAction::HideOriginal,
        );

        assert!(tasks.advance(Duration::from_millis(60)).is_empty());
        assert_eq!(
            tasks.advance(Duration::from_millis(60)),
            vec![(Entity::PLACEHOLDER, DeferredAction::HideOriginal)]
        );
        assert!(tasks.is_empty());
        assert!(tasks.advance(Duration::from_millis(60)).is_empty());
    }

    #[test]
    fn dropping_the_guard_cancels() {
        let mut tasks = DeferredMirrorTasks::default();
        let guard = tasks.schedule(
            Entity::PLACEHOLDER,
            Duration::from_millis(100),
            DeferredAction::HideOriginal,
        );
        let token = guard.token().clone();
        drop(guard);

        assert!(token.is_cancelled());
        assert!(tasks.advance(Duration::from_secs(1)).is_empty());
        assert_eq!(tasks.len(), 0);
    }
}
