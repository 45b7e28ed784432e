use arena_waves_core::{EntityHandle, KindId};
use arena_waves_pool::{
    EntityPool, Lifecycle, Placeable, Placement, PoolCapacity, PoolError, PoolRegistry,
    PoolTemplate, Registration, ReleaseOutcome,
};
use glam::{Quat, Vec3};

#[derive(Debug)]
struct Token {
    template: KindId,
    live: bool,
}

impl Placeable for Token {
    fn place(&mut self, _placement: Placement) {}
}

fn lifecycle() -> Lifecycle<Token> {
    Lifecycle::new(|kind| {
        Ok(Token {
            template: kind,
            live: false,
        })
    })
    .on_acquire(|token: &mut Token| token.live = true)
    .on_release(|token: &mut Token| token.live = false)
}

fn origin() -> Placement {
    Placement::new(Vec3::ZERO, Quat::IDENTITY)
}

#[test]
fn acquire_release_acquire_returns_same_instance() {
    let mut pool = EntityPool::new(KindId::new(1), lifecycle(), PoolCapacity::new(1, 8));

    let first = pool.acquire().expect("first acquire");
    assert_eq!(pool.release(first), Ok(ReleaseOutcome::Retained));
    let second = pool.acquire().expect("second acquire");

    assert_eq!(first, second, "free instance should be reused");
    assert_eq!(pool.stats().created, 1, "no new instance should be built");
}

#[test]
fn free_list_retains_at_most_max_capacity() {
    const MAX: usize = 4;
    const EXTRA: usize = 3;
    let mut pool = EntityPool::new(KindId::new(1), lifecycle(), PoolCapacity::new(2, MAX));

    let handles: Vec<EntityHandle> = (0..MAX + EXTRA)
        .map(|_| pool.acquire().expect("acquire"))
        .collect();
    for handle in &handles {
        assert!(pool.release(*handle).is_ok());
    }

    let stats = pool.stats();
    assert_eq!(stats.free, MAX);
    assert_eq!(stats.destroyed, EXTRA as u64);

    let created_before = stats.created;
    for _ in 0..MAX + EXTRA {
        let _ = pool.acquire().expect("burst acquire");
    }
    assert_eq!(pool.stats().created - created_before, EXTRA as u64);
}

#[test]
fn double_release_leaves_free_list_unchanged() {
    let mut pool = EntityPool::new(KindId::new(1), lifecycle(), PoolCapacity::new(1, 8));
    let handle = pool.acquire().expect("acquire");

    assert!(pool.release(handle).is_ok());
    let free_before = pool.stats().free;
    assert_eq!(
        pool.release(handle),
        Err(PoolError::DoubleRelease { handle })
    );
    assert_eq!(pool.stats().free, free_before);

    let first = pool.acquire().expect("reacquire");
    let second = pool.acquire().expect("fresh acquire");
    assert_ne!(first, second, "one pooled instance must not be handed out twice");
}

#[test]
fn kinds_never_share_instances() {
    let kinds = [KindId::new(10), KindId::new(20), KindId::new(30)];
    let mut registry = PoolRegistry::new();
    for kind in kinds {
        registry
            .register(
                kind,
                PoolTemplate::new(lifecycle(), PoolCapacity::new(2, 3)),
                Registration::Lazy,
            )
            .expect("register");
    }

    let mut live: Vec<EntityHandle> = Vec::new();
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    for _ in 0..2_000 {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        let roll = (state >> 33) as usize;

        if roll % 3 == 0 && !live.is_empty() {
            let handle = live.swap_remove(roll % live.len());
            assert!(registry.release(handle).is_ok());
        } else {
            let kind = kinds[roll % kinds.len()];
            let handle = registry.spawn(kind, origin()).expect("spawn");
            let token = registry.get(handle).expect("live token");
            assert_eq!(handle.kind(), kind);
            assert_eq!(token.template, kind, "instance crossed kinds");
            assert!(token.live);
            live.push(handle);
        }
    }

    assert_eq!(registry.live_count(), live.len());
}
