// Thu Aug 27 2026 - Alex

pub mod responder;

pub use responder::ScanService;
