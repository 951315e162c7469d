use super::*;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
enum Ping {
    A(u32),
    B(u32),
}

impl Message for Ping {
    fn channel(&self) -> &'static str {
        match self {
            Ping::A(_) => "a",
            Ping::B(_) => "b",
        }
    }
}

type Log = Rc<RefCell<Vec<String>>>;

fn logger(log: &Log, tag: &'static str) -> impl Fn(&Ping) + 'static {
    let log = log.clone();
    move |m| log.borrow_mut().push(format!("{tag}:{m:?}"))
}

#[test]
fn delivers_fifo_per_channel() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    bus.subscribe("a", logger(&log, "x"));
    bus.subscribe("b", logger(&log, "y"));
    bus.send(Ping::B(1));
    bus.send(Ping::A(2));
    bus.send(Ping::B(3));
    assert_eq!(bus.pending(), 3);
    assert_eq!(bus.pump(), 3);
    assert_eq!(*log.borrow(), vec!["y:B(1)", "x:A(2)", "y:B(3)"]);
}

#[test]
fn keyed_subscription_is_idempotent() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    let first = bus.subscribe_keyed("a", "session", logger(&log, "old"));
    let second = bus.subscribe_keyed("a", "session", logger(&log, "new"));
    assert_eq!(first, second);
    assert_eq!(bus.subscriber_count("a"), 1);

    bus.send(Ping::A(1));
    bus.pump();
    assert_eq!(*log.borrow(), vec!["new:A(1)"]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let bus = MessageBus::new();
    let log: Log = Rc::default();
    let id = bus.subscribe("a", logger(&log, "x"));
    bus.subscribe(ANY_CHANNEL, logger(&log, "any"));
    assert!(bus.unsubscribe(id));
    assert!(!bus.unsubscribe(id));
    bus.send(Ping::A(1));
    bus.pump();
    assert_eq!(*log.borrow(), vec!["any:A(1)"]);
}

#[test]
fn messages_sent_by_handlers_queue_behind_earlier_ones() {
    let bus: MessageBus<Ping> = MessageBus::new();
    let log: Log = Rc::default();
    let echo = bus.clone();
    bus.subscribe("a", move |m| {
        if let Ping::A(n) = m {
            echo.send(Ping::B(*n));
            assert_eq!(echo.pump(), 0);
        }
    });
    bus.subscribe("b", logger(&log, "b"));
    bus.send(Ping::A(1));
    bus.send(Ping::B(9));
    assert_eq!(bus.pump(), 3);
    assert_eq!(*log.borrow(), vec!["b:B(9)", "b:B(1)"]);
}

#[test]
fn panicking_handler_does_not_wedge_delivery() {
    let bus: MessageBus<Ping> = MessageBus::new();
    let log: Log = Rc::default();
    bus.subscribe("a", |m| {
        if *m == Ping::A(0) {
            panic!("handler failed");
        }
    });
    bus.subscribe("b", logger(&log, "y"));

    bus.send(Ping::A(0));
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| bus.pump()));
    assert!(outcome.is_err());

    bus.send(Ping::B(1));
    assert_eq!(bus.pump(), 1);
    assert_eq!(*log.borrow(), vec!["y:B(1)"]);
}
