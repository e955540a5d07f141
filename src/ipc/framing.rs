// Thu Aug 27 2026 - Alex

use crate::ipc::{ChannelError, RingChannel};
use bytes::{BufMut, BytesMut};
use log::trace;
use parking_lot::Mutex;

/// Length-prefixed messaging over a [`RingChannel`].
///
/// Frames are `[u32-le payload length][payload]` with no padding and no
/// checksum; payload bytes are opaque here. The frame is assembled in a
/// scratch buffer and handed to a single `produce` call, and that assembly
/// happens under this channel's own lock, so frames from concurrent senders
/// never interleave on the ring.
pub struct MessageChannel {
    ring: RingChannel,
    scratch: Mutex<BytesMut>,
}

pub const LENGTH_PREFIX: usize = 4;

impl MessageChannel {
    pub fn create(name: &str, capacity: usize) -> Result<Self, ChannelError> {
        Ok(Self::wrap(RingChannel::create(name, capacity)?))
    }

    pub fn attach(name: &str) -> Result<Self, ChannelError> {
        Ok(Self::wrap(RingChannel::attach(name)?))
    }

    fn wrap(ring: RingChannel) -> Self {
        Self {
            ring,
            scratch: Mutex::new(BytesMut::new()),
        }
    }

    /// Send one framed payload. Returns false if the channel closed (or the
    /// wake left insufficient space); nothing is written in that case.
    pub fn send(&self, payload: &[u8]) -> bool {
        debug_assert!(payload.len() <= u32::MAX as usize);

        let mut buffer = self.scratch.lock();
        buffer.clear();
        buffer.put_u32_le(payload.len() as u32);
        buffer.put_slice(payload);

        trace!("sending frame of {} bytes", payload.len());
        self.ring.produce(&buffer)
    }

    /// Receive one framed payload: exactly four length bytes, then exactly
    /// that many payload bytes. A failure on either read (channel closed
    /// mid-frame) discards the partial read and reports `None`.
    pub fn receive(&self) -> Option<Vec<u8>> {
        let mut prefix = [0u8; LENGTH_PREFIX];
        if !self.ring.consume(&mut prefix) {
            return None;
        }

        let length = u32::from_le_bytes(prefix) as usize;
        let mut payload = vec![0u8; length];
        if !self.ring.consume(&mut payload) {
            return None;
        }

        trace!("received frame of {} bytes", length);
        Some(payload)
    }

    pub fn close(&self) {
        self.ring.close();
    }

    pub fn reset(&self) {
        self.ring.reset();
    }

    pub fn is_closed(&self) -> bool {
        self.ring.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Base address of the underlying segment, for scan-result filtering.
    pub fn base_address(&self) -> u64 {
        self.ring.base_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::tests::unique_name;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_round_trip() {
        let channel = MessageChannel::create(&unique_name("frame"), 1024).unwrap();
        let payload: Vec<u8> = (0..200u16).map(|i| (i % 256) as u8).collect();

        assert!(channel.send(&payload));
        assert_eq!(channel.receive().unwrap(), payload);
    }

    #[test]
    fn test_zero_length_payload() {
        let channel = MessageChannel::create(&unique_name("empty"), 64).unwrap();
        assert!(channel.send(b""));
        let received = channel.receive().unwrap();
        assert!(received.is_empty());
    }

    #[test]
    fn test_frames_arrive_in_order() {
        let channel = MessageChannel::create(&unique_name("order"), 1024).unwrap();
        for i in 0..10u8 {
            assert!(channel.send(&[i; 3]));
        }
        for i in 0..10u8 {
            assert_eq!(channel.receive().unwrap(), vec![i; 3]);
        }
    }

    #[test]
    fn test_close_mid_read_reports_failure() {
        let channel = Arc::new(MessageChannel::create(&unique_name("cut"), 1024).unwrap());

        let receiver = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.receive())
        };

        thread::sleep(Duration::from_millis(50));
        channel.close();
        assert!(receiver.join().unwrap().is_none());
    }

    #[test]
    fn test_concurrent_senders_do_not_interleave() {
        let channel = Arc::new(MessageChannel::create(&unique_name("race"), 4096).unwrap());
        let frames_per_sender = 50usize;

        let senders: Vec<_> = [0x11u8, 0x22]
            .into_iter()
            .map(|fill| {
                let channel = Arc::clone(&channel);
                thread::spawn(move || {
                    for _ in 0..frames_per_sender {
                        assert!(channel.send(&[fill; 33]));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        for _ in 0..frames_per_sender * 2 {
            let frame = channel.receive().unwrap();
            assert_eq!(frame.len(), 33);
            let unique: HashSet<u8> = frame.iter().copied().collect();
            assert_eq!(unique.len(), 1, "frame bytes interleaved: {:?}", frame);
            seen.push(frame[0]);
        }

        for sender in senders {
            sender.join().unwrap();
        }
        assert_eq!(seen.iter().filter(|&&b| b == 0x11).count(), frames_per_sender);
        assert_eq!(seen.iter().filter(|&&b| b == 0x22).count(), frames_per_sender);
    }
}
