// Data models for hand keypoints, capture frames and assembled datasets

pub mod capture;
pub mod dataset;
pub mod hand;
