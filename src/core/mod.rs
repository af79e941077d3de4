pub mod config;

// Keypoint pipeline stages
pub mod selector;
pub mod sample_recorder;
pub mod sample_storage;
pub mod normalizer;
pub mod ledger;
pub mod assembler;

// Live recording
pub mod capture_loop;
