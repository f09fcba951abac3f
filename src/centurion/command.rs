use std::fmt;

/// A one-shot instruction for the garage door controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    OpenDoor,
    CloseDoor,
    StopDoor,
    LampOn,
    LampOff,
    VacationOn,
    VacationOff,
}

impl Command {
    /// The `param=value` pair appended to the controller's base URL.
    pub fn query(self) -> (&'static str, &'static str) {
        match self {
            Command::OpenDoor => ("door", "open"),
            Command::CloseDoor => ("door", "close"),
            Command::StopDoor => ("door", "stop"),
            Command::LampOn => ("lamp", "on"),
            Command::LampOff => ("lamp", "off"),
            Command::VacationOn => ("vacation", "on"),
            Command::VacationOff => ("vacation", "off"),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (param, value) = self.query();
        write!(f, "{param}={value}")
    }
}

/// Every request the controller understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceRequest {
    Status,
    Command(Command),
    CameraSnapshot,
}

impl DeviceRequest {
    pub fn query(self) -> (&'static str, &'static str) {
        match self {
            DeviceRequest::Status => ("status", "json"),
            DeviceRequest::Command(command) => command.query(),
            DeviceRequest::CameraSnapshot => ("camera", "snapshot"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_queries() {
        let expected = [
            (Command::OpenDoor, "door=open"),
            (Command::CloseDoor, "door=close"),
            (Command::StopDoor, "door=stop"),
            (Command::LampOn, "lamp=on"),
            (Command::LampOff, "lamp=off"),
            (Command::VacationOn, "vacation=on"),
            (Command::VacationOff, "vacation=off"),
        ];

        for (command, query) in expected {
            assert_eq!(command.to_string(), query);
        }
    }

    #[test]
    fn test_non_command_requests() {
        assert_eq!(DeviceRequest::Status.query(), ("status", "json"));
        assert_eq!(DeviceRequest::CameraSnapshot.query(), ("camera", "snapshot"));
        assert_eq!(
            DeviceRequest::Command(Command::StopDoor).query(),
            ("door", "stop")
        );
    }
}
