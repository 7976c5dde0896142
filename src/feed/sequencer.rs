use std::sync::mpsc::{self, Receiver, Sender};

use crate::feed::feed::FeedError;
use crate::CoordinateSet;

/// Handed out when a refresh request is issued; the response must carry the
/// same sequence number back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    pub sequence: u64,
    pub timestamp: String,
}

/// Issues monotonically increasing request numbers and accepts only the
/// newest one.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: Option<u64>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, timestamp: &str) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket {
            sequence: self.issued,
            timestamp: timestamp.to_string(),
        }
    }

    pub fn latest_issued(&self) -> u64 {
        self.issued
    }

    pub fn latest_applied(&self) -> Option<u64> {
        self.applied
    }

    /// True only for the most recently issued sequence that has not been
    /// settled yet.
    pub fn is_current(&self, sequence: u64) -> bool {
        sequence != 0 && sequence == self.issued && self.applied.map_or(true, |a| a < sequence)
    }

    pub fn settle(&mut self, sequence: u64) {
        self.applied = Some(sequence);
    }
}

/// A fetch result travelling from a worker thread back to the frame thread.
#[derive(Debug)]
pub struct RefreshDelivery {
    pub sequence: u64,
    pub result: Result<CoordinateSet, FeedError>,
}

/// Cloneable handle fetch workers post their results through.
#[derive(Clone, Debug)]
pub struct RefreshSender {
    tx: Sender<RefreshDelivery>,
}

impl RefreshSender {
    /// Returns false when the receiving scene has been dropped.
    pub fn deliver(&self, sequence: u64, result: Result<CoordinateSet, FeedError>) -> bool {
        self.tx.send(RefreshDelivery { sequence, result }).is_ok()
    }
}

/// Receiving end, drained on the frame thread.
#[derive(Debug)]
pub struct RefreshInbox {
    tx: Sender<RefreshDelivery>,
    rx: Receiver<RefreshDelivery>,
}

impl RefreshInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        RefreshInbox { tx, rx }
    }

    pub fn sender(&self) -> RefreshSender {
        RefreshSender { tx: self.tx.clone() }
    }

    /// Everything delivered so far, in arrival order, without blocking.
    pub fn drain(&self) -> impl Iterator<Item = RefreshDelivery> + '_ {
        self.rx.try_iter()
    }
}

impl Default for RefreshInbox {
    fn default() -> Self {
        Self::new()
    }
}
