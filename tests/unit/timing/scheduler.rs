use super::*;
use std::cell::RefCell;
use std::rc::Rc;

fn recorder() -> (Rc<RefCell<Vec<(&'static str, Millis)>>>, Scheduler) {
    (Rc::new(RefCell::new(Vec::new())), Scheduler::new(16))
}

#[test]
fn fires_in_due_then_schedule_order() {
    let (log, s) = recorder();
    for (name, delay) in [("c", 30), ("a", 10), ("b", 10)] {
        let log = log.clone();
        let s2 = s.clone();
        s.schedule(delay, move || log.borrow_mut().push((name, s2.now())));
    }
    assert_eq!(s.advance(9), 0);
    assert_eq!(s.advance(1), 2);
    assert_eq!(s.now(), 10);
    assert_eq!(s.advance(100), 1);
    assert_eq!(s.now(), 110);
    assert_eq!(*log.borrow(), vec![("a", 10), ("b", 10), ("c", 30)]);
}

#[test]
fn cancelled_timers_never_fire() {
    let (log, s) = recorder();
    let l = log.clone();
    let h = s.schedule(5, move || l.borrow_mut().push(("x", 0)));
    assert!(h.is_pending());
    assert!(h.cancel());
    assert!(!h.cancel());
    assert!(!h.is_pending());
    s.advance(10);
    assert!(log.borrow().is_empty());
    assert_eq!(s.pending(), 0);
}

#[test]
fn callbacks_can_reschedule() {
    let (log, s) = recorder();
    let l = log.clone();
    let s2 = s.clone();
    s.schedule(10, move || {
        let l2 = l.clone();
        let s3 = s2.clone();
        s2.schedule(10, move || l2.borrow_mut().push(("inner", s3.now())));
    });
    assert_eq!(s.advance(25), 2);
    assert_eq!(*log.borrow(), vec![("inner", 20)]);
}

#[test]
fn frame_requests_land_on_the_next_boundary() {
    let s = Scheduler::new(16);
    assert_eq!(s.request_frame(|| {}).due(), 16);
    s.advance(16);
    assert_eq!(s.request_frame(|| {}).due(), 32);
    s.advance(5);
    assert_eq!(s.request_frame(|| {}).due(), 32);
}

#[test]
fn run_until_idle_drains_everything() {
    let (log, s) = recorder();
    for delay in [1000, 3, 250] {
        let l = log.clone();
        s.schedule(delay, move || l.borrow_mut().push(("t", delay)));
    }
    assert_eq!(s.next_due(), Some(3));
    assert_eq!(s.run_until_idle(), 3);
    assert_eq!(s.now(), 1000);
    assert_eq!(s.next_due(), None);
}
