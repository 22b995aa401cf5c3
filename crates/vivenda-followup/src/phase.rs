//! Decoding of the shared `followup_stage` counter.
//!
//! One integer on the lead row drives two sequential campaigns: stages
//! `0..4` belong to re-engagement, stages `4..4 + topic_count` to
//! nurturing, anything past that is done. The persisted representation
//! stays the single integer; this type exists so track logic never does
//! raw offset arithmetic.

/// Number of re-engagement stages before a lead enters nurturing.
pub const REENGAGEMENT_STAGE_COUNT: i32 = 4;

/// Where a lead currently sits in the follow-up lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowupPhase {
    /// Re-engagement messages already sent (0 means none yet).
    Reengagement(i32),
    /// Index of the next nurturing topic to send.
    Nurturing(i32),
    /// Every topic was sent; nothing left to do.
    Completed,
}

impl FollowupPhase {
    /// Decodes a raw stage counter given the nurturing topic count.
    #[must_use]
    pub fn from_stage(stage: i32, topic_count: i32) -> Self {
        if stage < REENGAGEMENT_STAGE_COUNT {
            Self::Reengagement(stage.max(0))
        } else if stage - REENGAGEMENT_STAGE_COUNT < topic_count {
            Self::Nurturing(stage - REENGAGEMENT_STAGE_COUNT)
        } else {
            Self::Completed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_below_four_are_reengagement() {
        for stage in 0..4 {
            assert_eq!(
                FollowupPhase::from_stage(stage, 6),
                FollowupPhase::Reengagement(stage)
            );
        }
    }

    #[test]
    fn stages_from_four_map_to_topic_indices() {
        assert_eq!(FollowupPhase::from_stage(4, 6), FollowupPhase::Nurturing(0));
        assert_eq!(FollowupPhase::from_stage(9, 6), FollowupPhase::Nurturing(5));
    }

    #[test]
    fn past_the_last_topic_is_completed() {
        assert_eq!(FollowupPhase::from_stage(10, 6), FollowupPhase::Completed);
        assert_eq!(FollowupPhase::from_stage(50, 6), FollowupPhase::Completed);
    }

    #[test]
    fn negative_stage_is_clamped() {
        assert_eq!(
            FollowupPhase::from_stage(-1, 6),
            FollowupPhase::Reengagement(0)
        );
    }
}
