//! Connection state machine

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected in this session
    #[default]
    Absent,
    Connecting,
    Open,
    Closing,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connect,
    /// Handshake completed
    Accepted,
    /// Peer closed the connection
    RemoteClosed,
    Failed,
    /// Local close requested
    Disconnect,
    /// Peer answered our close
    CloseAck,
}

impl ConnectionState {
    /// Next state for `event`, or `None` when the event does not apply.
    pub fn transition(self, event: ConnectionEvent) -> Option<ConnectionState> {
        use ConnectionEvent as E;
        use ConnectionState as S;

        match (self, event) {
            (S::Absent | S::Closed, E::Connect) => Some(S::Connecting),
            (S::Connecting, E::Accepted) => Some(S::Open),
            (S::Connecting | S::Open | S::Closing, E::RemoteClosed | E::Failed) => Some(S::Closed),
            (S::Connecting | S::Open, E::Disconnect) => Some(S::Closing),
            (S::Closing, E::CloseAck) => Some(S::Closed),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        *self == ConnectionState::Open
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Absent => "absent",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionEvent as E;
    use ConnectionState as S;

    #[test]
    fn test_happy_path() {
        let s = S::Absent.transition(E::Connect).unwrap();
        assert_eq!(s, S::Connecting);
        let s = s.transition(E::Accepted).unwrap();
        assert_eq!(s, S::Open);
        let s = s.transition(E::Disconnect).unwrap();
        assert_eq!(s, S::Closing);
        assert_eq!(s.transition(E::CloseAck), Some(S::Closed));
    }

    #[test]
    fn test_connect_is_ignored_while_active() {
        assert_eq!(S::Open.transition(E::Connect), None);
        assert_eq!(S::Connecting.transition(E::Connect), None);
        assert_eq!(S::Closing.transition(E::Connect), None);
        assert_eq!(S::Closed.transition(E::Connect), Some(S::Connecting));
    }

    #[test]
    fn test_failures_close() {
        for state in [S::Connecting, S::Open, S::Closing] {
            assert_eq!(state.transition(E::Failed), Some(S::Closed));
            assert_eq!(state.transition(E::RemoteClosed), Some(S::Closed));
        }
        assert_eq!(S::Absent.transition(E::Failed), None);
        assert_eq!(S::Closed.transition(E::RemoteClosed), None);
    }

    #[test]
    fn test_disconnect_only_from_active() {
        assert_eq!(S::Connecting.transition(E::Disconnect), Some(S::Closing));
        assert_eq!(S::Absent.transition(E::Disconnect), None);
        assert_eq!(S::Closed.transition(E::Disconnect), None);
        assert_eq!(S::Closing.transition(E::Disconnect), None);
    }
}
