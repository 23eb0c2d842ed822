//! Arm selection: decide which anatomical side to track for a detected pose.

use crate::pose::{Keypoint, KeypointIndex, Pose};

/// Tracked side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmSide {
    Left,
    Right,
}

/// The shoulder/elbow/wrist triple for the selected side, pixel coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Arm {
    pub side: ArmSide,
    pub shoulder: Keypoint,
    pub elbow: Keypoint,
    pub wrist: Keypoint,
}

fn side_confidence(
    pose: &Pose,
    shoulder: KeypointIndex,
    elbow: KeypointIndex,
    wrist: KeypointIndex,
) -> f32 {
    (pose.get(shoulder).confidence + pose.get(elbow).confidence + pose.get(wrist).confidence) / 3.0
}

/// Pick the arm whose shoulder/elbow/wrist mean confidence is strictly
/// higher than the other side's AND strictly above `min_confidence`.
///
/// Strict greater-than on both comparisons: an exact left/right tie yields
/// no selection even when both sides are above the threshold.
pub fn select_arm(pose: &Pose, min_confidence: f32) -> Option<Arm> {
    let left_conf = side_confidence(
        pose,
        KeypointIndex::LeftShoulder,
        KeypointIndex::LeftElbow,
        KeypointIndex::LeftWrist,
    );
    let right_conf = side_confidence(
        pose,
        KeypointIndex::RightShoulder,
        KeypointIndex::RightElbow,
        KeypointIndex::RightWrist,
    );

    if left_conf > right_conf && left_conf > min_confidence {
        Some(Arm {
            side: ArmSide::Left,
            shoulder: *pose.get(KeypointIndex::LeftShoulder),
            elbow: *pose.get(KeypointIndex::LeftElbow),
            wrist: *pose.get(KeypointIndex::LeftWrist),
        })
    } else if right_conf > left_conf && right_conf > min_confidence {
        Some(Arm {
            side: ArmSide::Right,
            shoulder: *pose.get(KeypointIndex::RightShoulder),
            elbow: *pose.get(KeypointIndex::RightElbow),
            wrist: *pose.get(KeypointIndex::RightWrist),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose_with_arms(left_conf: f32, right_conf: f32) -> Pose {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(100.0, 50.0, left_conf);
        keypoints[KeypointIndex::LeftElbow as usize] = Keypoint::new(100.0, 120.0, left_conf);
        keypoints[KeypointIndex::LeftWrist as usize] = Keypoint::new(100.0, 190.0, left_conf);
        keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(200.0, 50.0, right_conf);
        keypoints[KeypointIndex::RightElbow as usize] = Keypoint::new(200.0, 120.0, right_conf);
        keypoints[KeypointIndex::RightWrist as usize] = Keypoint::new(200.0, 190.0, right_conf);
        Pose::new(keypoints)
    }

    #[test]
    fn test_left_wins_when_clearly_more_confident() {
        let pose = pose_with_arms(0.8, 0.3);
        let arm = select_arm(&pose, 0.5).unwrap();
        assert_eq!(arm.side, ArmSide::Left);
        assert_eq!(arm.elbow.x, 100.0);
    }

    #[test]
    fn test_right_wins_when_slightly_more_confident() {
        let pose = pose_with_arms(0.9, 0.95);
        let arm = select_arm(&pose, 0.5).unwrap();
        assert_eq!(arm.side, ArmSide::Right);
        assert_eq!(arm.elbow.x, 200.0);
    }

    #[test]
    fn test_exact_tie_at_threshold_selects_nothing() {
        let pose = pose_with_arms(0.5, 0.5);
        assert!(select_arm(&pose, 0.5).is_none());
    }

    #[test]
    fn test_exact_tie_above_threshold_selects_nothing() {
        // Both sides confident, but tied: still no selection.
        let pose = pose_with_arms(0.8, 0.8);
        assert!(select_arm(&pose, 0.5).is_none());
    }

    #[test]
    fn test_both_below_threshold_selects_nothing() {
        let pose = pose_with_arms(0.4, 0.3);
        assert!(select_arm(&pose, 0.5).is_none());
    }

    #[test]
    fn test_winner_must_clear_threshold() {
        // Left beats right but does not clear 0.5.
        let pose = pose_with_arms(0.45, 0.2);
        assert!(select_arm(&pose, 0.5).is_none());
    }

    #[test]
    fn test_mean_is_over_all_three_joints() {
        // Left wrist occluded: mean (0.9 + 0.9 + 0.0) / 3 = 0.6 still wins
        // over a uniformly weak right side.
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[KeypointIndex::LeftShoulder as usize] = Keypoint::new(0.0, 0.0, 0.9);
        keypoints[KeypointIndex::LeftElbow as usize] = Keypoint::new(0.0, 0.0, 0.9);
        keypoints[KeypointIndex::LeftWrist as usize] = Keypoint::new(0.0, 0.0, 0.0);
        keypoints[KeypointIndex::RightShoulder as usize] = Keypoint::new(0.0, 0.0, 0.4);
        keypoints[KeypointIndex::RightElbow as usize] = Keypoint::new(0.0, 0.0, 0.4);
        keypoints[KeypointIndex::RightWrist as usize] = Keypoint::new(0.0, 0.0, 0.4);
        let pose = Pose::new(keypoints);
        let arm = select_arm(&pose, 0.5).unwrap();
        assert_eq!(arm.side, ArmSide::Left);
    }
}
