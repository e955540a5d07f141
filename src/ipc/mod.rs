// Thu Aug 27 2026 - Alex

pub mod error;
pub mod framing;
pub mod ring;
pub mod shm;

pub use error::ChannelError;
pub use framing::MessageChannel;
pub use ring::RingChannel;
pub use shm::SharedSegment;

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Segment names unique per test and per process so parallel test runs
    /// never collide in the shm namespace.
    pub fn unique_name(tag: &str) -> String {
        format!(
            "/memprobe-test-{}-{}-{}",
            tag,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        )
    }
}
