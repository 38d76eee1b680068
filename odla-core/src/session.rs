//! One device peer: bytes in, replies out.

use log::{debug, warn};

use odla_net::binary::encode_status;
use odla_net::map::encode_feedback;
use odla_net::{InboundDecoder, Protocol};

use crate::config::DriverSettings;
use crate::dispatch::Driver;
use crate::host::Host;
use crate::status::{collect_status, feedback};

/// Decoder and driver state for a single connection. Create a fresh one
/// per connection so partial messages never leak across peers.
pub struct Session {
    protocol: Protocol,
    decoder: InboundDecoder,
    driver: Driver,
}

impl Session {
    pub fn new(protocol: Protocol, settings: DriverSettings) -> Self {
        Self {
            protocol,
            decoder: InboundDecoder::new(protocol),
            driver: Driver::new(settings),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Decode `bytes`, run every completed command in order and return the
    /// encoded replies, one per command that asked for one.
    pub fn handle_bytes(&mut self, bytes: &[u8], host: &mut dyn Host) -> Vec<Vec<u8>> {
        let mut replies = Vec::new();
        for inbound in self.decoder.push(bytes) {
            let result = self.driver.dispatch(&inbound.command, host);
            if !result.wants_reply() {
                debug!("no reply for {:?}: {:?}", inbound.command.kind, result);
                continue;
            }

            let encoded = if self.protocol.replies_with_feedback() {
                // Map peers only get a reply when they asked for fields
                let Some(flags) = inbound.feedback else {
                    continue;
                };
                encode_feedback(&feedback(host, flags))
            } else {
                let Some(status) = collect_status(host) else {
                    debug!("selection has no reportable range");
                    continue;
                };
                encode_status(&status)
            };

            match encoded {
                Ok(bytes) => replies.push(bytes),
                Err(e) => warn!("could not encode reply: {}", e),
            }
        }
        replies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::headless::{HeadlessHost, Score};
    use odla_net::binary::{decode_status, COMMON_LEN};

    #[test]
    fn text_lines_get_binary_status() {
        let mut host = HeadlessHost::new(Score::single_staff(10));
        let mut session = Session::new(Protocol::Text, DriverSettings::default());

        assert!(session.handle_bytes(b"GOTO MEA", &mut host).is_empty());
        let replies = session.handle_bytes(b"SURE 5\nPLAY\n", &mut host);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].len(), COMMON_LEN);
        assert_eq!(replies[0][0] as usize, COMMON_LEN);
        assert!(decode_status(&replies[0]).is_ok());
        assert_eq!(host.focused_measure(), 4);
    }

    #[test]
    fn closed_score_sends_nothing() {
        let mut host = HeadlessHost::new(Score::single_staff(4));
        host.set_document_open(false);
        let mut session = Session::new(Protocol::Text, DriverSettings::default());
        assert!(session.handle_bytes(b"PLAY\nSTOP\n", &mut host).is_empty());
    }
}
