use serde::{Deserialize, Deserializer, Serialize};

/// Authenticated Twitch user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: u64,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub profile_image_url: String,
}

/// Body of `GET /users`; only the first record is used.
#[derive(Debug, Deserialize)]
pub(crate) struct UsersResponse {
    #[serde(default)]
    pub data: Vec<User>,
}

// Helix returns ids as decimal strings.
fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_id_is_accepted() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "display_name": "Alice",
            "email": "a@x.com",
            "profile_image_url": "u"
        }))
        .unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.display_name, "Alice");
    }

    #[test]
    fn string_id_is_parsed() {
        let user: User = serde_json::from_value(json!({
            "id": "141981764",
            "display_name": "TwitchDev",
            "email": "dev@example.com",
            "profile_image_url": "https://static-cdn.jtvnw.net/x.png",
            "login": "twitchdev"
        }))
        .unwrap();
        assert_eq!(user.id, 141_981_764);
    }

    #[test]
    fn non_numeric_id_is_rejected() {
        let result = serde_json::from_value::<User>(json!({
            "id": "abc",
            "display_name": "x"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn missing_email_defaults_to_empty() {
        let user: User = serde_json::from_value(json!({"id": 2, "display_name": "Bob"})).unwrap();
        assert_eq!(user.email, "");
        assert_eq!(user.profile_image_url, "");
    }
}
