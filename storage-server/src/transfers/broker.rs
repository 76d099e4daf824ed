//! Token broker for out-of-band byte streams
//!
//! When a session is opened over the control port its [`ByteStream`] is
//! parked here under a random token. The client presents the token on the
//! transfer port to claim the stream. Each token is redeemable once.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::sessions::{ByteStream, ClientId};

struct Parked {
    session_id: String,
    owner: ClientId,
    stream: ByteStream,
}

#[derive(Default)]
pub struct EndpointBroker {
    parked: Mutex<HashMap<String, Parked>>,
}

impl EndpointBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Parked>> {
        self.parked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Park `stream` and return the token that claims it
    pub fn park(&self, session_id: &str, owner: ClientId, stream: ByteStream) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.lock().insert(
            token.clone(),
            Parked {
                session_id: session_id.to_string(),
                owner,
                stream,
            },
        );
        token
    }

    /// Claim a parked stream, returning its session id
    pub fn redeem(&self, token: &str) -> Option<(String, ByteStream)> {
        self.lock()
            .remove(token)
            .map(|parked| (parked.session_id, parked.stream))
    }

    /// Drop the unclaimed stream of a session `owner` opened, if any
    ///
    /// Dropping an upload's stream ends its content. Streams parked by other
    /// clients are left alone.
    pub fn discard_session(&self, session_id: &str, owner: ClientId) -> bool {
        let mut parked = self.lock();
        let before = parked.len();
        parked.retain(|_, p| p.session_id != session_id || p.owner != owner);
        parked.len() != before
    }

    /// Drop every unclaimed stream belonging to `owner`
    pub fn discard_client(&self, owner: ClientId) -> usize {
        let mut parked = self.lock();
        let before = parked.len();
        parked.retain(|_, p| p.owner != owner);
        before - parked.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage_common::validators::validate_token;

    fn stream() -> ByteStream {
        ByteStream::pair().0
    }

    #[test]
    fn test_tokens_are_valid_and_single_use() {
        let broker = EndpointBroker::new();
        let token = broker.park("s1", ClientId::next(), stream());
        assert!(validate_token(&token).is_ok());

        let (session_id, _stream) = broker.redeem(&token).unwrap();
        assert_eq!(session_id, "s1");
        assert!(broker.redeem(&token).is_none());
    }

    #[test]
    fn test_unknown_token() {
        let broker = EndpointBroker::new();
        assert!(broker.redeem("0123456789abcdef0123456789abcdef").is_none());
    }

    #[test]
    fn test_discard_session() {
        let broker = EndpointBroker::new();
        let owner = ClientId::next();
        let token = broker.park("s1", owner, stream());
        broker.park("s2", owner, stream());

        assert!(broker.discard_session("s1", owner));
        assert!(!broker.discard_session("s1", owner));
        assert!(broker.redeem(&token).is_none());
        assert_eq!(broker.len(), 1);
    }

    #[test]
    fn test_discard_session_of_other_client_is_ignored() {
        let broker = EndpointBroker::new();
        let owner = ClientId::next();
        let token = broker.park("s1", owner, stream());

        assert!(!broker.discard_session("s1", ClientId::next()));
        let (session_id, _stream) = broker.redeem(&token).unwrap();
        assert_eq!(session_id, "s1");
    }

    #[test]
    fn test_discard_client() {
        let broker = EndpointBroker::new();
        let first = ClientId::next();
        let second = ClientId::next();
        broker.park("a", first, stream());
        broker.park("b", first, stream());
        broker.park("c", second, stream());

        assert_eq!(broker.discard_client(first), 2);
        assert_eq!(broker.len(), 1);
    }
}
