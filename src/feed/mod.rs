pub mod feed;
pub mod sequencer;
