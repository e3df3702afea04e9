use syncnet_shared::{
    encode, ConnectionId, HeartbeatMessage, NetworkMessage, ProbeSender, Transport,
    TransportError,
};

/// Sends heartbeat probes for one connection through the manager's transport
pub(crate) struct TransportProbeSender<'a> {
    transport: &'a mut dyn Transport,
    to: Option<ConnectionId>,
}

impl<'a> TransportProbeSender<'a> {
    pub(crate) fn new(transport: &'a mut dyn Transport, to: Option<ConnectionId>) -> Self {
        Self { transport, to }
    }
}

impl ProbeSender for TransportProbeSender<'_> {
    fn send_probe(&mut self, probe: &HeartbeatMessage) -> Result<(), TransportError> {
        let payload = encode(&NetworkMessage::Heartbeat(probe.clone())).map_err(|error| {
            TransportError::SendFailed {
                payload_size: 0,
                reason: error.to_string(),
            }
        })?;
        self.transport.send(&payload, self.to)
    }
}
