#[cfg(test)]
mod tests {
    use crate::logic::{generate_slots, MinuteRange, SLOT_STEP_MINUTES};
    use proptest::prelude::*;

    fn ranges(max: usize) -> impl Strategy<Value = Vec<MinuteRange>> {
        prop::collection::vec((0i64..1440, 1i64..180), 0..max)
            .prop_map(|v| v.into_iter().map(|(s, len)| MinuteRange::new(s, s + len)).collect())
    }

    fn window() -> impl Strategy<Value = MinuteRange> {
        (0i64..720, 60i64..720).prop_map(|(start, len)| MinuteRange::new(start, start + len))
    }

    proptest! {
        #[test]
        fn test_slots_fit_inside_window(
            window in window(),
            duration in 15i64..180,
            breaks in ranges(4),
            blocked in ranges(6),
        ) {
            let slots = generate_slots(window, duration, SLOT_STEP_MINUTES, &breaks, &blocked);
            for s in &slots {
                prop_assert!(*s >= window.start);
                prop_assert!(s + duration <= window.end);
                prop_assert_eq!((s - window.start) % SLOT_STEP_MINUTES, 0);
            }
        }

        #[test]
        fn test_slots_never_overlap_blocked_ranges(
            window in window(),
            duration in 15i64..180,
            blocked in ranges(6),
        ) {
            let slots = generate_slots(window, duration, SLOT_STEP_MINUTES, &[], &blocked);
            for s in &slots {
                for b in &blocked {
                    prop_assert!(!(*s < b.end && s + duration > b.start));
                }
            }
        }

        #[test]
        fn test_slot_edges_never_fall_in_a_break(
            window in window(),
            duration in 15i64..180,
            breaks in ranges(4),
        ) {
            let slots = generate_slots(window, duration, SLOT_STEP_MINUTES, &breaks, &[]);
            for s in &slots {
                for b in &breaks {
                    prop_assert!(!b.contains(*s));
                    prop_assert!(!b.contains(s + duration - 1));
                }
            }
        }

        #[test]
        fn test_slots_are_ascending_and_deterministic(
            window in window(),
            duration in 15i64..180,
            breaks in ranges(4),
            blocked in ranges(6),
        ) {
            let first = generate_slots(window, duration, SLOT_STEP_MINUTES, &breaks, &blocked);
            let second = generate_slots(window, duration, SLOT_STEP_MINUTES, &breaks, &blocked);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn test_adding_a_booking_only_removes_slots(
            window in window(),
            duration in 15i64..180,
            blocked in ranges(6),
            extra_start in 0i64..1440,
            extra_len in 1i64..180,
        ) {
            let before = generate_slots(window, duration, SLOT_STEP_MINUTES, &[], &blocked);
            let mut more = blocked.clone();
            more.push(MinuteRange::new(extra_start, extra_start + extra_len));
            let after = generate_slots(window, duration, SLOT_STEP_MINUTES, &[], &more);
            prop_assert!(after.iter().all(|s| before.contains(s)));
        }
    }
}
