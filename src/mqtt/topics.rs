use crate::settings::MqttSettings;

/// Topic layout for one bridged controller.
#[derive(Clone, Debug)]
pub struct Topics {
    base: String,
    discovery_prefix: String,
    node_id: String,
}

impl Topics {
    pub fn new(settings: &MqttSettings) -> Self {
        Self {
            base: settings.base_topic(),
            discovery_prefix: settings.discovery_prefix.trim_end_matches('/').to_string(),
            node_id: settings.node_id.clone(),
        }
    }

    pub fn availability(&self) -> String {
        format!("{}/availability", self.base)
    }

    /// Raw status payload, used as entity attributes.
    pub fn status(&self) -> String {
        format!("{}/status", self.base)
    }

    pub fn state(&self, object_id: &str) -> String {
        format!("{}/{}/state", self.base, object_id)
    }

    pub fn command(&self, object_id: &str) -> String {
        format!("{}/{}/set", self.base, object_id)
    }

    pub fn command_filter(&self) -> String {
        self.command("+")
    }

    pub fn camera_image(&self) -> String {
        format!("{}/camera/image", self.base)
    }

    pub fn discovery(&self, component: &str, object_id: &str) -> String {
        format!(
            "{}/{}/{}/{}/config",
            self.discovery_prefix, component, self.node_id, object_id
        )
    }

    /// Home Assistant's birth/last-will topic.
    pub fn home_assistant_status(&self) -> String {
        format!("{}/status", self.discovery_prefix)
    }

    pub fn unique_id(&self, object_id: &str) -> String {
        format!("{}_{}", self.node_id, object_id)
    }

    /// Inverse of [`Topics::command`].
    pub fn command_object_id<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let object_id = topic
            .strip_prefix(self.base.as_str())?
            .strip_prefix('/')?
            .strip_suffix("/set")?;

        (!object_id.is_empty() && !object_id.contains('/')).then_some(object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(base_topic: Option<&str>) -> Topics {
        Topics::new(&MqttSettings {
            id: "centurion-mqtt".to_string(),
            host: "localhost".to_string(),
            port: 1883,
            username: None,
            password: None,
            discovery_prefix: "homeassistant".to_string(),
            node_id: "centurion_garage".to_string(),
            base_topic: base_topic.map(str::to_string),
        })
    }

    #[test]
    fn test_default_layout() {
        let topics = topics(None);

        assert_eq!(topics.availability(), "centurion/centurion_garage/availability");
        assert_eq!(topics.state("lamp"), "centurion/centurion_garage/lamp/state");
        assert_eq!(topics.command_filter(), "centurion/centurion_garage/+/set");
        assert_eq!(
            topics.discovery("cover", "cover"),
            "homeassistant/cover/centurion_garage/cover/config"
        );
        assert_eq!(topics.home_assistant_status(), "homeassistant/status");
        assert_eq!(topics.unique_id("wifi_signal"), "centurion_garage_wifi_signal");
    }

    #[test]
    fn test_command_object_id() {
        let topics = topics(Some("garage"));

        assert_eq!(topics.command_object_id("garage/cover/set"), Some("cover"));
        assert_eq!(topics.command_object_id(&topics.command("vacation")), Some("vacation"));
        assert_eq!(topics.command_object_id("garage/cover/state"), None);
        assert_eq!(topics.command_object_id("garage//set"), None);
        assert_eq!(topics.command_object_id("garage/a/b/set"), None);
        assert_eq!(topics.command_object_id("garagex/cover/set"), None);
        assert_eq!(topics.command_object_id("other/cover/set"), None);
    }
}
