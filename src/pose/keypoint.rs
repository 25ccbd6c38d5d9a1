use serde::{Deserialize, Serialize};

use crate::error::PoseError;

/// MoveNet の 17 キーポイント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum BodyPart {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl BodyPart {
    pub const COUNT: usize = 17;

    /// インデックス順の全部位
    pub const ALL: [BodyPart; BodyPart::COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// インデックスから部位を取得（範囲外はエラー）
    pub fn from_index(index: usize) -> Result<Self, PoseError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(PoseError::BodyPartNotFound(index))
    }

    pub fn position(self) -> usize {
        self as usize
    }
}

/// 単一キーポイント（画像ピクセル座標、yは下向き）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub body_part: BodyPart,
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub score: f32,
}

impl Keypoint {
    pub fn new(body_part: BodyPart, x: f32, y: f32, score: f32) -> Self {
        Self {
            body_part,
            x,
            y,
            score,
        }
    }

    /// 信頼度が閾値以上か（NaN は無効扱い）
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.score >= threshold
    }

    /// 座標が有限値か
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 検出矩形（分類では未使用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// 1フレーム内の1人分の検出結果
///
/// キーポイントは常に17個、`BodyPart::position()` の順に並ぶ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PersonRecord", into = "PersonRecord")]
pub struct Person {
    pub id: Option<i32>,
    keypoints: [Keypoint; BodyPart::COUNT],
    pub bounding_box: Option<BoundingBox>,
    /// 検出全体の信頼度
    pub score: f32,
}

impl Person {
    /// (x, y, score) をインデックス順に割り当てて作成
    pub fn from_positions(points: [(f32, f32, f32); BodyPart::COUNT], score: f32) -> Self {
        let keypoints = std::array::from_fn(|i| {
            let (x, y, s) = points[i];
            Keypoint::new(BodyPart::ALL[i], x, y, s)
        });
        Self {
            id: None,
            keypoints,
            bounding_box: None,
            score,
        }
    }

    /// 外部推定器の出力から作成
    ///
    /// 17個ちょうどで、各要素の部位がインデックスと一致していること。
    pub fn from_keypoints(keypoints: Vec<Keypoint>, score: f32) -> Result<Self, PoseError> {
        let actual = keypoints.len();
        let keypoints: [Keypoint; BodyPart::COUNT] =
            keypoints.try_into().map_err(|_| PoseError::KeypointCount {
                expected: BodyPart::COUNT,
                actual,
            })?;

        for (index, kp) in keypoints.iter().enumerate() {
            if kp.body_part.position() != index {
                return Err(PoseError::KeypointOrder {
                    index,
                    found: kp.body_part,
                });
            }
        }

        Ok(Self {
            id: None,
            keypoints,
            bounding_box: None,
            score,
        })
    }

    pub fn get(&self, part: BodyPart) -> &Keypoint {
        &self.keypoints[part.position()]
    }

    pub fn keypoints(&self) -> &[Keypoint; BodyPart::COUNT] {
        &self.keypoints
    }
}

#[derive(Serialize, Deserialize)]
struct PersonRecord {
    #[serde(default)]
    id: Option<i32>,
    keypoints: Vec<Keypoint>,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
    score: f32,
}

impl TryFrom<PersonRecord> for Person {
    type Error = PoseError;

    fn try_from(record: PersonRecord) -> Result<Self, Self::Error> {
        let mut person = Person::from_keypoints(record.keypoints, record.score)?;
        person.id = record.id;
        person.bounding_box = record.bounding_box;
        Ok(person)
    }
}

impl From<Person> for PersonRecord {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            keypoints: person.keypoints.to_vec(),
            bounding_box: person.bounding_box,
            score: person.score,
        }
    }
}
