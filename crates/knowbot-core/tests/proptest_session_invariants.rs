//! Property-based invariant tests for the session controller.
//!
//! Arbitrary interleavings of user intent, page signals and clock advances
//! are replayed against a [`HeadlessPage`]. After every step:
//!
//! 1. An open session is always active, and the page classes mirror state
//! 2. At most one content surface is ever created
//! 3. A closed session never has an idle countdown pending
//! 4. Once throttles settle, the active class equals a fresh evaluation
//! 5. Every closed state leaves the lock-managed inline styles untouched
//! 6. Pending deadlines never lie in the past
//!
//! Plus standalone properties for wildcard exclusions and the scroll lock.

use core::time::Duration;

use knowbot_core::host::{ACTIVE_CLASS, OPEN_CLASS};
use knowbot_core::scroll_lock::ScrollLock;
use knowbot_core::visibility::{self, PathPattern};
use knowbot_core::{
    ActivityKind, HeadlessPage, PageHost, SessionController, StyleProperty, WidgetConfig,
};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

const ADDRESSES: [&str; 3] = [
    "https://bot.example.org/chat",
    "https://bot.example.org/billing",
    "/knowbot/embed",
];

#[derive(Debug, Clone)]
enum Op {
    Open,
    OpenAt(usize),
    Close,
    Scroll(f64),
    Resize(f64, f64),
    Activity(ActivityKind),
    Navigate(bool),
    Advance(u64),
}

fn activity_strategy() -> impl Strategy<Value = ActivityKind> {
    prop_oneof![
        Just(ActivityKind::PointerMove),
        Just(ActivityKind::TouchStart),
        Just(ActivityKind::KeyDown),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        2 => Just(Op::Open),
        1 => (0..ADDRESSES.len()).prop_map(Op::OpenAt),
        2 => Just(Op::Close),
        3 => (0.0f64..2_000.0).prop_map(Op::Scroll),
        1 => (320.0f64..1_600.0, 300.0f64..1_200.0).prop_map(|(w, h)| Op::Resize(w, h)),
        3 => activity_strategy().prop_map(Op::Activity),
        1 => any::<bool>().prop_map(Op::Navigate),
        4 => (0u64..8_000).prop_map(Op::Advance),
    ]
}

fn session() -> SessionController<HeadlessPage> {
    let mut config = WidgetConfig::new(ADDRESSES[0]);
    config.inactivity_timeout = Duration::from_secs(5);
    config.exclude_paths = vec![PathPattern::parse("/checkout/*").unwrap()];
    let page = HeadlessPage::new("/pricing")
        .with_viewport(390.0, 700.0)
        .with_style(StyleProperty::Position, "relative");
    SessionController::new(config, page).unwrap()
}

fn apply(session: &mut SessionController<HeadlessPage>, op: &Op) {
    match op {
        Op::Open => session.open(),
        Op::OpenAt(idx) => session.open_at(ADDRESSES[*idx]),
        Op::Close => session.close(),
        Op::Scroll(offset) => {
            // A pinned page cannot scroll.
            if !session.scroll_lock().is_engaged() {
                session.host_mut().metrics.scroll_offset = *offset;
                session.on_scroll();
            }
        }
        Op::Resize(width, height) => {
            let metrics = &mut session.host_mut().metrics;
            metrics.viewport_width = *width;
            metrics.viewport_height = *height;
            session.on_resize();
        }
        Op::Activity(kind) => session.on_activity(*kind),
        Op::Navigate(to_anchor) => {
            let hash = if *to_anchor { "#knowbot" } else { "#faq" };
            session.on_navigation(hash);
        }
        Op::Advance(ms) => session.advance(Duration::from_millis(*ms)),
    }
}

fn fresh_evaluation(session: &SessionController<HeadlessPage>) -> bool {
    let page = session.host();
    visibility::is_active(
        session.is_open(),
        page.metrics(),
        &page.path(),
        &session.config().visibility_rules(),
    )
}

// ═══════════════════════════════════════════════════════════════════════
// 1-3, 5, 6. Per-step structural invariants
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn structural_invariants_hold_after_every_step(
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let mut session = session();

        for op in &ops {
            apply(&mut session, op);
            let page = session.host();

            if session.is_open() {
                prop_assert!(session.is_active(), "open but inactive after {op:?}");
            }
            prop_assert_eq!(page.has_class(OPEN_CLASS), session.is_open());
            prop_assert_eq!(page.has_class(ACTIVE_CLASS), session.is_active());
            prop_assert!(page.surfaces_created <= 1);

            if !session.is_open() {
                prop_assert_eq!(session.inactivity_deadline(), None);
                prop_assert!(!session.scroll_lock().is_engaged());
                prop_assert_eq!(page.style(StyleProperty::Position), "relative");
                prop_assert_eq!(page.style(StyleProperty::Top), "");
                prop_assert_eq!(page.style(StyleProperty::Overflow), "");
            }

            if let Some(deadline) = session.next_deadline() {
                prop_assert!(deadline >= session.now());
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Settled active class matches a fresh evaluation
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn settled_active_class_matches_fresh_evaluation(
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let mut session = session();

        for op in &ops {
            apply(&mut session, op);
            // One throttle interval with no new signals flushes evaluation.
            session.advance(Duration::from_millis(16));
            prop_assert_eq!(session.is_active(), fresh_evaluation(&session));
        }
    }

    #[test]
    fn a_session_left_alone_always_ends_closed(
        ops in prop::collection::vec(op_strategy(), 1..40),
    ) {
        let mut session = session();
        for op in &ops {
            apply(&mut session, op);
        }

        // Idle timeout plus the activity settle window.
        session.advance(Duration::from_secs(6));

        prop_assert!(!session.is_open());
        prop_assert_eq!(session.next_deadline(), None);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Wildcard exclusions
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn wildcard_matches_exactly_the_paths_under_its_prefix(
        prefix in "/[a-z/]{0,8}",
        suffix in "[a-z/]{0,8}",
        other in "/[a-z/]{0,12}",
    ) {
        let pattern = PathPattern::parse(&format!("{prefix}*")).unwrap();
        let path = format!("{prefix}{suffix}");

        prop_assert!(pattern.matches(&path));
        prop_assert_eq!(pattern.matches(&other), other.starts_with(&prefix));
    }

    #[test]
    fn exact_entries_match_only_themselves(
        entry in "/[a-z/]{0,10}",
        other in "/[a-z/]{0,10}",
    ) {
        let pattern = PathPattern::parse(&entry).unwrap();

        prop_assert!(pattern.matches(&entry));
        prop_assert_eq!(pattern.matches(&other), other == entry);
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Scroll lock round trip
// ═══════════════════════════════════════════════════════════════════════

fn inline_value() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[a-z0-9%]{1,8}"]
}

proptest! {
    #[test]
    fn lock_round_trip_restores_styles_and_offset(
        offset in 0.0f64..10_000.0,
        styles in prop::array::uniform4(inline_value()),
        engage_twice in any::<bool>(),
    ) {
        let mut page = HeadlessPage::default().with_scroll(offset);
        for (property, value) in StyleProperty::ALL.into_iter().zip(&styles) {
            page.set_inline_style(property, value);
        }
        let before = page.styles.clone();

        let mut lock = ScrollLock::new();
        lock.engage(&mut page);
        if engage_twice {
            page.metrics.scroll_offset = 0.0;
            lock.engage(&mut page);
        }
        lock.disengage(&mut page);
        lock.disengage(&mut page);

        prop_assert_eq!(page.styles, before);
        prop_assert_eq!(page.metrics.scroll_offset, offset);
        prop_assert!(page.scroll_log.len() <= 1);
    }
}
