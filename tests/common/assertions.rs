//! Custom assertion macros
//!
//! Unwrap results with a readable panic message instead of a bare
//! `unwrap()` backtrace.

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a result is an error, optionally of a given variant
#[macro_export]
macro_rules! assert_err {
    ($result:expr) => {
        assert!($result.is_err(), "Expected Err, got Ok");
    };
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => panic!("Expected different error variant, got: {:?}", e),
        }
    };
}

/// Assert that a connection received exactly these event types, in order
#[macro_export]
macro_rules! assert_events {
    ($connection:expr, [$($event:expr),* $(,)?]) => {
        let received = $connection.event_types();
        let expected: Vec<chatbox::shared::EventType> = vec![$($event),*];
        pretty_assertions::assert_eq!(received, expected, "events for {}", $connection.username);
    };
}
