use std::panic::{catch_unwind, AssertUnwindSafe};

use chamberscope::data::scheduler::RenderScheduler;

#[test]
fn many_offers_one_render_with_the_last_value() {
    let mut s = RenderScheduler::new();
    let requests: Vec<bool> = (1..=5).map(|i| s.offer(i)).collect();
    assert_eq!(requests, vec![true, false, false, false, false]);
    assert_eq!(s.pending(), Some(&5));

    let mut seen = Vec::new();
    s.fire(|v| seen.push(v));
    assert!(s.fire(|v| seen.push(v)).is_none());
    assert_eq!(seen, vec![5]);
    assert!(!s.is_scheduled());
}

#[test]
fn flag_clears_even_when_render_panics() {
    let mut s = RenderScheduler::new();
    s.offer("bad");
    let result = catch_unwind(AssertUnwindSafe(|| {
        s.fire(|_| panic!("render failed"));
    }));
    assert!(result.is_err());
    assert!(!s.is_scheduled());
    assert!(!s.has_pending());
    assert!(s.offer("good"));
}
