use super::*;

type Log = Rc<RefCell<Vec<(Millis, Size)>>>;

fn sequencer(scheduler: &Scheduler) -> (BatchSequencer, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let clock = scheduler.clone();
    let seq = BatchSequencer::new(scheduler, 1000, move |size| {
        sink.borrow_mut().push((clock.now(), size));
    });
    (seq, log)
}

#[test]
fn walks_sizes_then_sentinel_then_idles() {
    let scheduler = Scheduler::default();
    let (seq, log) = sequencer(&scheduler);
    let sizes = [Size::new(800, 600), Size::new(1920, 1080)];

    assert_eq!(seq.state(), BatchState::Idle);
    seq.start(&sizes).unwrap();
    assert_eq!(seq.state(), BatchState::Running { step: 0 });
    assert_eq!(seq.capture_size(), Some(Size::new(800, 600)));

    scheduler.advance(999);
    assert_eq!(seq.state(), BatchState::Running { step: 0 });
    scheduler.advance(1);
    assert_eq!(seq.state(), BatchState::Running { step: 1 });
    assert_eq!(seq.capture_size(), Some(Size::new(1920, 1080)));

    scheduler.advance(1000);
    assert_eq!(seq.state(), BatchState::Running { step: 2 });
    assert_eq!(seq.capture_size(), None);

    scheduler.advance(1000);
    assert_eq!(seq.state(), BatchState::Idle);
    assert_eq!(
        *log.borrow(),
        vec![
            (0, Size::new(800, 600)),
            (1000, Size::new(1920, 1080)),
            (2000, Size::ZERO),
        ]
    );
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn start_while_running_is_rejected() {
    let scheduler = Scheduler::default();
    let (seq, log) = sequencer(&scheduler);
    seq.start(&[Size::new(10, 10)]).unwrap();
    scheduler.advance(1000);
    assert_eq!(
        seq.start(&[Size::new(20, 20)]),
        Err(BatchError::AlreadyRunning { step: 1 })
    );
    scheduler.run_until_idle();
    assert_eq!(log.borrow().len(), 2);
    assert!(!seq.is_running());

    seq.start(&[Size::new(20, 20)]).unwrap();
    assert_eq!(log.borrow().last(), Some(&(2000, Size::new(20, 20))));
}

#[test]
fn cancel_stops_remaining_steps() {
    let scheduler = Scheduler::default();
    let (seq, log) = sequencer(&scheduler);
    seq.start(&[Size::new(1, 1), Size::new(2, 2), Size::new(3, 3)])
        .unwrap();
    scheduler.advance(1000);
    assert!(seq.cancel());
    assert!(!seq.cancel());
    assert_eq!(seq.state(), BatchState::Idle);
    assert_eq!(scheduler.pending(), 0);
    scheduler.advance(10_000);
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn empty_job_still_signals_sentinel() {
    let scheduler = Scheduler::default();
    let (seq, log) = sequencer(&scheduler);
    seq.start(&[]).unwrap();
    assert_eq!(seq.capture_size(), None);
    scheduler.run_until_idle();
    assert_eq!(*log.borrow(), vec![(0, Size::ZERO)]);
    assert!(!seq.is_running());
}

#[test]
fn restart_from_signal_is_not_double_driven() {
    let scheduler = Scheduler::default();
    let slot: Rc<RefCell<Option<BatchSequencer>>> = Rc::new(RefCell::new(None));
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let (hook, sink, clock) = (Rc::clone(&slot), Rc::clone(&log), scheduler.clone());
    let seq = BatchSequencer::new(&scheduler, 1000, move |size| {
        sink.borrow_mut().push((clock.now(), size));
        if size.is_empty() && sink.borrow().len() < 4 {
            let seq = hook.borrow().clone().unwrap();
            seq.cancel();
            seq.start(&[Size::new(5, 5)]).unwrap();
        }
    });
    *slot.borrow_mut() = Some(seq.clone());

    seq.start(&[Size::new(4, 4)]).unwrap();
    scheduler.run_until_idle();
    assert_eq!(
        *log.borrow(),
        vec![
            (0, Size::new(4, 4)),
            (1000, Size::ZERO),
            (1000, Size::new(5, 5)),
            (2000, Size::ZERO),
        ]
    );
    assert!(!seq.is_running());
    *slot.borrow_mut() = None;
}
