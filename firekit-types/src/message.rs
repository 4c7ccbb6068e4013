//! Push message payloads.
//!
//! These mirror the messaging service's v1 JSON message shape. Only the
//! structure is enforced here (for example exactly one [`Target`]); the
//! service validates everything else.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Where a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// A single device registration token
    Token(String),
    /// All devices subscribed to a topic
    Topic(String),
    /// A boolean topic expression, e.g. `'a' in topics && 'b' in topics`
    Condition(String),
}

impl Target {
    /// Which kind of target this is: `token`, `topic` or `condition`.
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Token(_) => "token",
            Target::Topic(_) => "topic",
            Target::Condition(_) => "condition",
        }
    }
}

/// A push message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Delivery target (serialized as `token`, `topic` or `condition`).
    #[serde(flatten)]
    pub target: Target,
    /// Basic notification shown by the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    /// Arbitrary key/value payload handed to the app.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Android-specific options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidConfig>,
    /// APNs-specific options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apns: Option<ApnsConfig>,
    /// Web push options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webpush: Option<WebpushConfig>,
    /// Options shared by all platforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_options: Option<FcmOptions>,
}

impl Message {
    /// Create a message for the given target with no payload.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            notification: None,
            data: BTreeMap::new(),
            android: None,
            apns: None,
            webpush: None,
            fcm_options: None,
        }
    }

    /// Message to a single device token.
    pub fn to_token(token: &str) -> Self {
        Self::new(Target::Token(token.to_string()))
    }

    /// Message to a topic. A leading `/topics/` is stripped.
    pub fn to_topic(topic: &str) -> Self {
        let topic = topic.strip_prefix("/topics/").unwrap_or(topic);
        Self::new(Target::Topic(topic.to_string()))
    }

    /// Message to a topic condition.
    pub fn to_condition(condition: &str) -> Self {
        Self::new(Target::Condition(condition.to_string()))
    }

    /// Set the notification title and body.
    pub fn with_notification(mut self, title: &str, body: &str) -> Self {
        let notification = self.notification.get_or_insert_with(Notification::default);
        notification.title = Some(title.to_string());
        notification.body = Some(body.to_string());
        self
    }

    /// Add one data entry.
    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    /// Set Android options.
    pub fn with_android(mut self, android: AndroidConfig) -> Self {
        self.android = Some(android);
        self
    }

    /// Set the analytics label.
    pub fn with_analytics_label(mut self, label: &str) -> Self {
        self.fcm_options = Some(FcmOptions {
            analytics_label: Some(label.to_string()),
        });
        self
    }
}

/// Basic notification content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Title line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Android delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AndroidPriority {
    /// Normal priority
    Normal,
    /// High priority, wakes the device
    High,
}

/// Android-specific options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidConfig {
    /// Collapse key for grouping messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse_key: Option<String>,
    /// Delivery priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<AndroidPriority>,
    /// How long the message is kept while the device is offline.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "duration_secs"
    )]
    pub ttl: Option<Duration>,
    /// Package name the registration token must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted_package_name: Option<String>,
    /// Android-only data, overriding [`Message::data`].
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Android notification overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<AndroidNotification>,
}

/// Android notification overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndroidNotification {
    /// Title line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Drawable resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Icon colour in `#rrggbb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Sound resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    /// Replaces earlier notifications with the same tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Intent action on tap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_action: Option<String>,
    /// Notification channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// APNs-specific options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApnsConfig {
    /// Raw APNs request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Raw APNs payload (the `aps` dictionary and custom keys).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

/// Web push options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebpushConfig {
    /// Web push protocol headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Web-only data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Raw Web Notification options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<serde_json::Value>,
}

/// Options shared by all platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FcmOptions {
    /// Label for delivery analytics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_label: Option<String>,
}

/// Durations in the service's `"3.5s"` string form.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match ttl {
            Some(d) if d.subsec_nanos() == 0 => s.serialize_str(&format!("{}s", d.as_secs())),
            Some(d) => {
                let nanos = format!("{:09}", d.subsec_nanos());
                s.serialize_str(&format!("{}.{}s", d.as_secs(), nanos.trim_end_matches('0')))
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };
        let secs = raw
            .strip_suffix('s')
            .ok_or_else(|| serde::de::Error::custom(format!("duration without unit: {raw}")))?;
        secs.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| Some(Duration::from_secs_f64(v)))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {raw}")))
    }
}
