//! The interface between a chaincode and the peer hosting it.

use serde::Serialize;

use crate::error::Result;

mod stub;

pub use stub::TxStub;

/// Status of a successful response.
pub const OK: i32 = 200;
/// Status at or above which a response is a failure.
pub const ERROR_THRESHOLD: i32 = 400;
/// Status of an error response.
pub const ERROR: i32 = 500;

/// The result a chaincode hands back to its peer for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub status: i32,
    pub message: String,
    #[serde(serialize_with = "as_lossy_str")]
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Response {
            status: OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response {
            status: ERROR,
            message: message.into(),
            payload: vec![],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status < ERROR_THRESHOLD
    }
}

pub(crate) fn as_lossy_str<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// The host services available to a chaincode while it handles a
/// transaction.
pub trait ChaincodeStub {
    /// All invocation arguments, including the function name.
    fn args(&self) -> &[String];

    fn tx_id(&self) -> &str;

    fn channel_id(&self) -> &str;

    /// Splits the arguments into the function name (the first argument) and
    /// its parameters. An empty argument list yields an empty function name.
    fn function_and_parameters(&self) -> (&str, &[String]) {
        match self.args().split_first() {
            Some((function, params)) => (function.as_str(), params),
            None => ("", &[]),
        }
    }

    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()>;

    fn del_state(&mut self, key: &str) -> Result<()>;

    /// Attaches an event to the transaction. A transaction carries at most one
    /// event; setting another replaces it.
    fn set_event(&mut self, name: &str, payload: Vec<u8>) -> Result<()>;
}

/// A smart contract run by the peer.
pub trait Chaincode {
    /// Called once when the chaincode is instantiated on a channel.
    fn init(&self, stub: &mut dyn ChaincodeStub) -> Response;

    /// Called for every transaction proposal and query.
    fn invoke(&self, stub: &mut dyn ChaincodeStub) -> Response;
}
