//! A chaincode which counts its invocations and emits an event for each one.

use log::debug;

use crate::shim::{Chaincode, ChaincodeStub, Response};

/// State key holding the decimal invocation count.
pub const NUM_EVENTS: &str = "numEvents";

/// Prefix of every event name emitted by `EventSender`.
pub const EVENT_PREFIX: &str = "evtsender";

#[derive(Debug, Default, Clone, Copy)]
pub struct EventSender;

impl Chaincode for EventSender {
    fn init(&self, stub: &mut dyn ChaincodeStub) -> Response {
        debug!("init");
        match stub.put_state(NUM_EVENTS, b"0".to_vec()) {
            Ok(()) => Response::success(Vec::new()),
            Err(err) => Response::error(err.to_string()),
        }
    }

    fn invoke(&self, stub: &mut dyn ChaincodeStub) -> Response {
        debug!("invoke");
        let (function, args) = stub.function_and_parameters();
        if function != "invoke" {
            return Response::error("Unknown function call");
        }

        let name = args.first().cloned();
        match name.as_deref() {
            Some("invoke") => self.send_event(stub),
            Some("query") => self.query(stub),
            Some("clear") => self.clear(stub),
            _ => Response::error("Invalid invoke function name. Expecting \"invoke\" \"query\""),
        }
    }
}

impl EventSender {
    /// Bumps the counter and emits `evtsender<args[0]>` with payload
    /// `Event <old count><args[1]>`.
    fn send_event(&self, stub: &mut dyn ChaincodeStub) -> Response {
        debug!("invoke start");
        let (_, args) = stub.function_and_parameters();
        if args.len() != 2 {
            return Response::error("Incorrect number of arguments. Expecting 2");
        }
        let event_name = format!("{}{}", EVENT_PREFIX, args[0]);
        let suffix = args[1].clone();

        let stored = match stub.get_state(NUM_EVENTS) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(_) => return Response::error("Failed to get state"),
        };
        let num_events = parse_count(&stored);

        let mut to_send = b"Event ".to_vec();
        to_send.extend_from_slice(&stored);
        to_send.extend_from_slice(suffix.as_bytes());

        debug!("invoke - numEvents: {}", num_events);
        debug!("invoke - tosend: {}", String::from_utf8_lossy(&to_send));
        debug!("invoke - eventName: {}", event_name);

        let next = match num_events.checked_add(1) {
            Some(next) => next,
            None => return Response::error("Counter overflow"),
        };
        if let Err(err) = stub.put_state(NUM_EVENTS, next.to_string().into_bytes()) {
            return Response::error(err.to_string());
        }
        if let Err(err) = stub.set_event(&event_name, to_send) {
            return Response::error(err.to_string());
        }
        Response::success(Vec::new())
    }

    fn clear(&self, stub: &mut dyn ChaincodeStub) -> Response {
        debug!("clear");
        match stub.put_state(NUM_EVENTS, b"0".to_vec()) {
            Ok(()) => Response::success(Vec::new()),
            Err(err) => Response::error(err.to_string()),
        }
    }

    fn query(&self, stub: &mut dyn ChaincodeStub) -> Response {
        debug!("query");
        match stub.get_state(NUM_EVENTS) {
            Ok(stored) => {
                let stored = stored.unwrap_or_default();
                debug!("query - numEvents: {}", parse_count(&stored));
                Response::success(stored)
            }
            Err(_) => Response::error("Failed to get state"),
        }
    }
}

/// Parses a stored count, treating anything that is not a decimal integer as
/// zero.
fn parse_count(stored: &[u8]) -> i64 {
    std::str::from_utf8(stored)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}
