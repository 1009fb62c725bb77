use derive_more::Display;

/// Outcome of the last motion detection pass.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionStatus {
    #[default]
    #[display(fmt = "Sem movimento")]
    NoMotion,

    #[display(fmt = "Movimento Detectado")]
    MotionDetected,
}

impl MotionStatus {
    pub fn is_detected(&self) -> bool {
        matches!(self, Self::MotionDetected)
    }
}

impl From<MotionStatus> for u8 {
    fn from(value: MotionStatus) -> Self {
        match value {
            MotionStatus::NoMotion => 0,
            MotionStatus::MotionDetected => 1,
        }
    }
}

impl From<u8> for MotionStatus {
    fn from(value: u8) -> Self {
        if value == 0 {
            Self::NoMotion
        } else {
            Self::MotionDetected
        }
    }
}
