//! Event-file front ends.

pub mod yaml;
