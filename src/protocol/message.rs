use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// Read access to the three server-side timestamps carried by one NTP reply.
///
/// Implemented by whatever component parses packets off the wire. A raw
/// value of 0 in any field means the sender never set it.
pub trait TimingMessage {
    /// Originate timestamp (T1): when the client sent the request, as echoed
    /// by the server.
    fn originate_timestamp(&self) -> Timestamp;

    /// Receive timestamp (T2): when the server received the request.
    fn receive_timestamp(&self) -> Timestamp;

    /// Transmit timestamp (T3): when the server sent the reply.
    fn transmit_timestamp(&self) -> Timestamp;
}

/// Plain carrier for the three reply timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTimestamps {
    /// Originate timestamp (T1)
    pub originate: Timestamp,
    /// Receive timestamp (T2)
    pub receive: Timestamp,
    /// Transmit timestamp (T3)
    pub transmit: Timestamp,
}

impl ReplyTimestamps {
    /// Creates a new reply-timestamp set.
    pub fn new(originate: Timestamp, receive: Timestamp, transmit: Timestamp) -> Self {
        ReplyTimestamps {
            originate,
            receive,
            transmit,
        }
    }
}

impl TimingMessage for ReplyTimestamps {
    fn originate_timestamp(&self) -> Timestamp {
        self.originate
    }

    fn receive_timestamp(&self) -> Timestamp {
        self.receive
    }

    fn transmit_timestamp(&self) -> Timestamp {
        self.transmit
    }
}
