pub mod geometry;
pub mod keypoint;

pub use keypoint::{BodyPart, BoundingBox, Keypoint, Person};
