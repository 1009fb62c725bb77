use derive_more::Display;

/// Whether a simulated actuator (air conditioner, room light) is running.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorStatus {
    #[display(fmt = "LIGADO")]
    On,

    #[default]
    #[display(fmt = "DESLIGADO")]
    Off,
}

impl From<bool> for ActuatorStatus {
    fn from(value: bool) -> Self {
        if value {
            Self::On
        } else {
            Self::Off
        }
    }
}

impl From<ActuatorStatus> for u8 {
    fn from(value: ActuatorStatus) -> Self {
        match value {
            ActuatorStatus::Off => 0,
            ActuatorStatus::On => 1,
        }
    }
}

impl From<u8> for ActuatorStatus {
    /// Note: any non zero value is treated as on.
    fn from(value: u8) -> Self {
        (value != 0).into()
    }
}
