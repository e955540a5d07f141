// Thu Aug 27 2026 - Alex

use crate::ipc::shm::SharedSegment;
use crate::ipc::ChannelError;
use log::debug;
use std::mem;
use std::ptr::{self, addr_of_mut};

/// Bookkeeping slack added on top of header + capacity, matching the
/// allocator overhead the segment has always been sized with.
const SEGMENT_SLACK: usize = 64 * 1024;

/// Fixed-size bookkeeping at the front of the segment, followed by the raw
/// byte storage. The mutex and both condvars are process-shared; every
/// index/flag below them is only touched with the mutex held.
///
/// `count` is tracked explicitly: with `head == tail` the ring is either
/// empty or full, and `count` is what disambiguates.
#[repr(C)]
struct ChannelHeader {
    mutex: libc::pthread_mutex_t,
    not_empty: libc::pthread_cond_t,
    not_full: libc::pthread_cond_t,
    head: usize,
    tail: usize,
    count: usize,
    capacity: usize,
    closed: u32,
}

/// A bounded circular byte channel in memory shared between two processes.
///
/// `produce`/`consume` move exact-size blocks and block until the ring has
/// room/data or the channel is closed. Capacity is fixed at creation;
/// callers must never request a single transfer larger than the capacity —
/// such a call can never be satisfied and will block until `close`.
pub struct RingChannel {
    segment: SharedSegment,
}

// The raw pointers all target the shared segment, and every access to the
// mutable parts goes through the process-shared mutex.
unsafe impl Send for RingChannel {}
unsafe impl Sync for RingChannel {}

impl RingChannel {
    /// Create the backing segment and initialize the bookkeeping. The
    /// creating side owns the storage lifecycle.
    pub fn create(name: &str, capacity: usize) -> Result<Self, ChannelError> {
        if capacity == 0 {
            return Err(ChannelError::ZeroCapacity);
        }

        let size = mem::size_of::<ChannelHeader>() + capacity + SEGMENT_SLACK;
        let segment = SharedSegment::create(name, size)?;
        let channel = Self { segment };

        unsafe {
            channel.init_header(capacity)?;
        }
        debug!("ring channel {} open with capacity {}", name, capacity);
        Ok(channel)
    }

    /// Attach to an existing channel by name without taking ownership of
    /// the backing storage.
    pub fn attach(name: &str) -> Result<Self, ChannelError> {
        let segment = SharedSegment::open(name)?;
        if segment.len() < mem::size_of::<ChannelHeader>() {
            return Err(ChannelError::SegmentTooSmall(segment.len()));
        }

        let channel = Self { segment };
        let capacity = unsafe { (*channel.header()).capacity };
        if capacity == 0
            || channel.segment.len() < mem::size_of::<ChannelHeader>() + capacity
        {
            return Err(ChannelError::SegmentTooSmall(channel.segment.len()));
        }
        Ok(channel)
    }

    unsafe fn init_header(&self, capacity: usize) -> Result<(), ChannelError> {
        let header = self.header();

        let mut mutex_attr: libc::pthread_mutexattr_t = mem::zeroed();
        if libc::pthread_mutexattr_init(&mut mutex_attr) != 0
            || libc::pthread_mutexattr_setpshared(&mut mutex_attr, libc::PTHREAD_PROCESS_SHARED)
                != 0
        {
            return Err(ChannelError::SyncInit("mutex attributes", errno()));
        }
        let rc = libc::pthread_mutex_init(addr_of_mut!((*header).mutex), &mutex_attr);
        libc::pthread_mutexattr_destroy(&mut mutex_attr);
        if rc != 0 {
            return Err(ChannelError::SyncInit("mutex", rc));
        }

        let mut cond_attr: libc::pthread_condattr_t = mem::zeroed();
        if libc::pthread_condattr_init(&mut cond_attr) != 0
            || libc::pthread_condattr_setpshared(&mut cond_attr, libc::PTHREAD_PROCESS_SHARED)
                != 0
        {
            return Err(ChannelError::SyncInit("condvar attributes", errno()));
        }
        let rc_empty = libc::pthread_cond_init(addr_of_mut!((*header).not_empty), &cond_attr);
        let rc_full = libc::pthread_cond_init(addr_of_mut!((*header).not_full), &cond_attr);
        libc::pthread_condattr_destroy(&mut cond_attr);
        if rc_empty != 0 || rc_full != 0 {
            return Err(ChannelError::SyncInit("condvar", rc_empty.max(rc_full)));
        }

        (*header).head = 0;
        (*header).tail = 0;
        (*header).count = 0;
        (*header).capacity = capacity;
        (*header).closed = 0;
        Ok(())
    }

    fn header(&self) -> *mut ChannelHeader {
        self.segment.as_ptr() as *mut ChannelHeader
    }

    fn data(&self) -> *mut u8 {
        unsafe { self.segment.as_ptr().add(mem::size_of::<ChannelHeader>()) }
    }

    /// Base address of the backing segment, for filtering scan results that
    /// land inside the transport itself.
    pub fn base_address(&self) -> u64 {
        self.segment.as_ptr() as u64
    }

    pub fn capacity(&self) -> usize {
        unsafe { (*self.header()).capacity }
    }

    pub fn is_creator(&self) -> bool {
        self.segment.is_creator()
    }

    /// Bytes currently buffered.
    pub fn len(&self) -> usize {
        let header = self.header();
        unsafe {
            libc::pthread_mutex_lock(addr_of_mut!((*header).mutex));
            let count = (*header).count;
            libc::pthread_mutex_unlock(addr_of_mut!((*header).mutex));
            count
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        let header = self.header();
        unsafe {
            libc::pthread_mutex_lock(addr_of_mut!((*header).mutex));
            let closed = (*header).closed != 0;
            libc::pthread_mutex_unlock(addr_of_mut!((*header).mutex));
            closed
        }
    }

    /// Write `src` as one block. Blocks until the ring has room for the
    /// whole block or the channel closes; returns false without writing if
    /// it closed, or if space is still insufficient after a wake.
    pub fn produce(&self, src: &[u8]) -> bool {
        let header = self.header();
        unsafe {
            let mutex = addr_of_mut!((*header).mutex);
            libc::pthread_mutex_lock(mutex);

            while (*header).closed == 0 && (*header).capacity - (*header).count < src.len() {
                if libc::pthread_cond_wait(addr_of_mut!((*header).not_full), mutex) != 0 {
                    break;
                }
            }

            if (*header).closed != 0 || (*header).capacity - (*header).count < src.len() {
                libc::pthread_mutex_unlock(mutex);
                return false;
            }

            // The payload may straddle the end of the storage: at most two
            // contiguous copies.
            let capacity = (*header).capacity;
            let head = (*header).head;
            let first = src.len().min(capacity - head);
            ptr::copy_nonoverlapping(src.as_ptr(), self.data().add(head), first);
            if src.len() > first {
                ptr::copy_nonoverlapping(src.as_ptr().add(first), self.data(), src.len() - first);
            }

            (*header).head = (head + src.len()) % capacity;
            (*header).count += src.len();

            libc::pthread_cond_broadcast(addr_of_mut!((*header).not_empty));
            libc::pthread_mutex_unlock(mutex);
        }
        true
    }

    /// Read exactly `dest.len()` bytes. Blocks until that much is buffered
    /// or the channel closes; returns false without reading if it closed,
    /// or if data is still insufficient after a wake.
    pub fn consume(&self, dest: &mut [u8]) -> bool {
        let header = self.header();
        unsafe {
            let mutex = addr_of_mut!((*header).mutex);
            libc::pthread_mutex_lock(mutex);

            while (*header).closed == 0 && (*header).count < dest.len() {
                if libc::pthread_cond_wait(addr_of_mut!((*header).not_empty), mutex) != 0 {
                    break;
                }
            }

            if (*header).closed != 0 || (*header).count < dest.len() {
                libc::pthread_mutex_unlock(mutex);
                return false;
            }

            let capacity = (*header).capacity;
            let tail = (*header).tail;
            let first = dest.len().min(capacity - tail);
            ptr::copy_nonoverlapping(self.data().add(tail), dest.as_mut_ptr(), first);
            if dest.len() > first {
                ptr::copy_nonoverlapping(self.data(), dest.as_mut_ptr().add(first), dest.len() - first);
            }

            (*header).tail = (tail + dest.len()) % capacity;
            (*header).count -= dest.len();

            libc::pthread_cond_broadcast(addr_of_mut!((*header).not_full));
            libc::pthread_mutex_unlock(mutex);
        }
        true
    }

    /// Close the channel and wake every waiter on both conditions. Blocked
    /// produce/consume calls fail; later calls fail without blocking.
    pub fn close(&self) {
        let header = self.header();
        unsafe {
            libc::pthread_mutex_lock(addr_of_mut!((*header).mutex));
            (*header).closed = 1;
            libc::pthread_cond_broadcast(addr_of_mut!((*header).not_empty));
            libc::pthread_cond_broadcast(addr_of_mut!((*header).not_full));
            libc::pthread_mutex_unlock(addr_of_mut!((*header).mutex));
        }
    }

    /// Reopen after a close and drop any buffered bytes. The caller must
    /// ensure no producer or consumer is active; this only takes the mutex
    /// for the flag and index reset.
    pub fn reset(&self) {
        let header = self.header();
        unsafe {
            libc::pthread_mutex_lock(addr_of_mut!((*header).mutex));
            (*header).closed = 0;
            (*header).head = 0;
            (*header).tail = 0;
            (*header).count = 0;
            libc::pthread_mutex_unlock(addr_of_mut!((*header).mutex));
        }
    }
}

impl Drop for RingChannel {
    fn drop(&mut self) {
        // The creating side takes the storage with it; unblock any peer
        // still waiting before the segment goes away.
        if self.segment.is_creator() {
            self.close();
        }
    }
}

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::tests::unique_name;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_round_trip_with_wraparound() {
        let ring = RingChannel::create(&unique_name("wrap"), 8).unwrap();

        assert!(ring.produce(b"hello"));
        let mut out = [0u8; 5];
        assert!(ring.consume(&mut out));
        assert_eq!(&out, b"hello");

        // head/tail sit at 5 of 8: the next block straddles the end.
        assert!(ring.produce(b"worlds"));
        assert_eq!(ring.len(), 6);
        let mut out = [0u8; 6];
        assert!(ring.consume(&mut out));
        assert_eq!(&out, b"worlds");
        assert!(ring.is_empty());
    }

    #[test]
    fn test_fill_within_capacity_never_blocks() {
        let ring = RingChannel::create(&unique_name("fill"), 8).unwrap();
        assert!(ring.produce(b"abc"));
        assert!(ring.produce(b"def"));
        assert!(ring.produce(b"gh"));
        assert_eq!(ring.len(), 8);

        let mut out = [0u8; 8];
        assert!(ring.consume(&mut out));
        assert_eq!(&out, b"abcdefgh");
    }

    #[test]
    fn test_producer_blocks_until_space() {
        let ring = Arc::new(RingChannel::create(&unique_name("block"), 8).unwrap());
        assert!(ring.produce(b"12345"));

        let done = Arc::new(AtomicBool::new(false));
        let producer = {
            let ring = Arc::clone(&ring);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let ok = ring.produce(b"67890");
                done.store(true, Ordering::SeqCst);
                ok
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!done.load(Ordering::SeqCst), "producer should be blocked");

        let mut out = [0u8; 2];
        assert!(ring.consume(&mut out));
        assert_eq!(&out, b"12");

        assert!(producer.join().unwrap());
        let mut rest = [0u8; 8];
        assert!(ring.consume(&mut rest));
        assert_eq!(&rest, b"34567890");
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let ring = Arc::new(RingChannel::create(&unique_name("close"), 64).unwrap());

        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut buf = [0u8; 16];
                ring.consume(&mut buf)
            })
        };

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        ring.close();
        assert!(!consumer.join().unwrap());
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_calls_after_close_fail_immediately() {
        let ring = RingChannel::create(&unique_name("dead"), 64).unwrap();
        ring.close();
        assert!(!ring.produce(b"data"));
        let mut buf = [0u8; 1];
        assert!(!ring.consume(&mut buf));
    }

    #[test]
    fn test_reset_reopens_and_clears() {
        let ring = RingChannel::create(&unique_name("reset"), 64).unwrap();
        assert!(ring.produce(b"stale"));
        ring.close();
        assert!(ring.is_closed());

        ring.reset();
        assert!(!ring.is_closed());
        assert!(ring.is_empty());
        assert!(ring.produce(b"fresh"));
        let mut out = [0u8; 5];
        assert!(ring.consume(&mut out));
        assert_eq!(&out, b"fresh");
    }

    #[test]
    fn test_attached_channel_shares_state() {
        let name = unique_name("pair");
        let owner = RingChannel::create(&name, 64).unwrap();
        let peer = RingChannel::attach(&name).unwrap();
        assert_eq!(peer.capacity(), 64);
        assert!(!peer.is_creator());

        assert!(owner.produce(b"across"));
        let mut out = [0u8; 6];
        assert!(peer.consume(&mut out));
        assert_eq!(&out, b"across");
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            RingChannel::create(&unique_name("zero"), 0),
            Err(ChannelError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_count_stays_within_capacity() {
        let ring = RingChannel::create(&unique_name("invariant"), 16).unwrap();
        for chunk in [3usize, 7, 2, 4] {
            assert!(ring.produce(&vec![0xEE; chunk]));
            assert!(ring.len() <= ring.capacity());
        }
        assert_eq!(ring.len(), 16);
        let mut out = vec![0u8; 16];
        assert!(ring.consume(&mut out));
        assert_eq!(ring.len(), 0);
    }
}
