use crate::pose::BodyPart;

/// キーポイント入力の契約違反
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PoseError {
    #[error("body part not found for index {0}")]
    BodyPartNotFound(usize),

    #[error("expected {expected} keypoints, got {actual}")]
    KeypointCount { expected: usize, actual: usize },

    #[error("keypoint at index {index} is {found:?}")]
    KeypointOrder { index: usize, found: BodyPart },
}
