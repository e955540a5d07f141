// Thu Aug 27 2026 - Alex

use crate::ipc::MessageChannel;
use crate::memory::{ProcessMemory, RegionEnumerator};
use crate::proto::{Command, Envelope};
use crate::scan::{Pattern, ScanOrchestrator};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Answers scan requests arriving over the request channel with replies on
/// the reply channel, scanning this process's own address space.
///
/// An owned instance with explicit `start`/`stop`; nothing here is global.
/// The worker exits when the request channel closes or `stop` is called,
/// and occurrences inside either channel segment are filtered out so the
/// scanner never reports its own transport.
pub struct ScanService {
    requests: Arc<MessageChannel>,
    replies: Arc<MessageChannel>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ScanService {
    pub fn new(requests: MessageChannel, replies: MessageChannel) -> Self {
        Self {
            requests: Arc::new(requests),
            replies: Arc::new(replies),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Spawn the responder loop on a worker thread. A second call while
    /// already running is a no-op.
    pub fn start(&mut self) {
        if self.running.swap(true, Ordering::AcqRel) {
            return;
        }

        let requests = Arc::clone(&self.requests);
        let replies = Arc::clone(&self.replies);
        let running = Arc::clone(&self.running);

        self.worker = Some(std::thread::spawn(move || {
            serve_loop(&requests, &replies, &running);
            running.store(false, Ordering::Release);
        }));
    }

    /// Run the responder loop on the calling thread until the request
    /// channel closes.
    pub fn run(&self) {
        self.running.store(true, Ordering::Release);
        serve_loop(&self.requests, &self.replies, &self.running);
        self.running.store(false, Ordering::Release);
    }

    /// Close the request channel and join the worker. Blocked receives wake
    /// and fail, which ends the loop.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        self.requests.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for ScanService {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve_loop(requests: &MessageChannel, replies: &MessageChannel, running: &AtomicBool) {
    let reader = Arc::new(ProcessMemory::current_process());
    let enumerator = RegionEnumerator::current_process();
    let orchestrator = ScanOrchestrator::new(reader)
        .with_exclusions(vec![requests.base_address(), replies.base_address()]);

    info!("scan service ready on pid {}", std::process::id());

    while running.load(Ordering::Acquire) {
        let frame = match requests.receive() {
            Some(frame) => frame,
            None => break,
        };

        let envelope = match Envelope::decode(&frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping undecodable request: {}", e);
                continue;
            }
        };

        if let Some(reply) = handle_command(envelope.command, &orchestrator, &enumerator) {
            if !replies.send(&reply.encode()) {
                warn!("reply channel closed, stopping");
                break;
            }
        }
    }

    info!("scan service stopped");
}

fn handle_command(
    command: Command,
    orchestrator: &ScanOrchestrator,
    enumerator: &RegionEnumerator,
) -> Option<Envelope> {
    match command {
        Command::Find { value_type, value } => {
            let occurrences = match Pattern::new(&value) {
                Ok(pattern) => {
                    let found = orchestrator.scan_process(&pattern, enumerator);
                    info!(
                        "find({}, {} bytes): {} occurrences",
                        value_type,
                        value.len(),
                        found.len()
                    );
                    found
                }
                Err(e) => {
                    // Malformed search values produce an empty result, not
                    // an error reply.
                    warn!("find request rejected: {}", e);
                    Vec::new()
                }
            };
            Some(Envelope::new(Command::FindAck {
                value_type,
                value,
                occurrences,
            }))
        }
        Command::Write { offset } => {
            info!("write command at offset {} acknowledged (not applied)", offset);
            Some(Envelope::new(Command::Ack))
        }
        Command::Read { offset } => {
            info!("read command at offset {} acknowledged (not applied)", offset);
            Some(Envelope::new(Command::Ack))
        }
        Command::Dump => {
            info!("dump command acknowledged (not applied)");
            Some(Envelope::new(Command::Ack))
        }
        Command::Ack | Command::FindAck { .. } => {
            warn!("ignoring reply-kind command on the request channel");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::tests::unique_name;
    use crate::proto::{parse_value, render_value, ValueType};

    fn channel_pair(tag: &str) -> (MessageChannel, MessageChannel, MessageChannel, MessageChannel) {
        let req_name = unique_name(&format!("{}-req", tag));
        let rep_name = unique_name(&format!("{}-rep", tag));
        let client_req = MessageChannel::create(&req_name, 1024 * 1024).unwrap();
        let client_rep = MessageChannel::create(&rep_name, 1024 * 1024).unwrap();
        let service_req = MessageChannel::attach(&req_name).unwrap();
        let service_rep = MessageChannel::attach(&rep_name).unwrap();
        (client_req, client_rep, service_req, service_rep)
    }

    #[test]
    fn test_dump_is_acknowledged() {
        let (client_req, client_rep, service_req, service_rep) = channel_pair("ack");
        let mut service = ScanService::new(service_req, service_rep);
        service.start();

        assert!(client_req.send(&Envelope::new(Command::Dump).encode()));
        let reply = Envelope::decode(&client_rep.receive().unwrap()).unwrap();
        assert_eq!(reply.command, Command::Ack);

        service.stop();
        assert!(!service.is_running());
    }

    #[test]
    fn test_find_reports_planted_marker() {
        let (client_req, client_rep, service_req, service_rep) = channel_pair("find");
        let mut service = ScanService::new(service_req, service_rep);
        service.start();

        // A marker the scan should locate somewhere in our own heap. The
        // request/reply copies may add further hits; at least this one must
        // be there.
        let marker = Box::new(*b"\xFE\xED\xC0\xDE-memprobe-marker");

        let request = Envelope::new(Command::Find {
            value_type: ValueType::ByteArray,
            value: marker.to_vec(),
        });
        assert!(client_req.send(&request.encode()));

        let reply = Envelope::decode(&client_rep.receive().unwrap()).unwrap();
        match reply.command {
            Command::FindAck {
                value_type,
                value,
                occurrences,
            } => {
                assert_eq!(value_type, ValueType::ByteArray);
                assert_eq!(value, marker.to_vec());
                assert!(!occurrences.is_empty(), "marker not found in own memory");
                assert!(occurrences
                    .iter()
                    .all(|o| o.data_size == marker.len() as u64));
                let marker_addr = marker.as_ptr() as u64;
                assert!(occurrences.iter().any(|o| o.address() == marker_addr));

                // The echoed value must render back for display, and the
                // rendering must parse to the bytes that were searched.
                let rendered = render_value(&value, value_type);
                assert_eq!(parse_value(&rendered, value_type).unwrap(), value);
            }
            other => panic!("expected FindAck, got {:?}", other),
        }

        service.stop();
    }

    #[test]
    fn test_empty_pattern_yields_empty_result() {
        let (client_req, client_rep, service_req, service_rep) = channel_pair("badfind");
        let mut service = ScanService::new(service_req, service_rep);
        service.start();

        let request = Envelope::new(Command::Find {
            value_type: ValueType::String,
            value: Vec::new(),
        });
        assert!(client_req.send(&request.encode()));

        let reply = Envelope::decode(&client_rep.receive().unwrap()).unwrap();
        match reply.command {
            Command::FindAck { occurrences, .. } => assert!(occurrences.is_empty()),
            other => panic!("expected FindAck, got {:?}", other),
        }

        service.stop();
    }

    #[test]
    fn test_stop_unblocks_idle_service() {
        let (_client_req, _client_rep, service_req, service_rep) = channel_pair("stop");
        let mut service = ScanService::new(service_req, service_rep);
        service.start();
        assert!(service.is_running());
        service.stop();
        assert!(!service.is_running());
    }
}
