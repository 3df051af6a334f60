use serde::{Deserialize, Deserializer, Serialize};

use crate::types::ProfileId;

/// What kind of relationship a candidate is looking for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum SeekingType {
    Serious,
    Casual,
    #[default]
    #[serde(other)]
    Unspecified,
}

/// One swipeable profile.
///
/// Field names on the wire follow the backend profile row (`name`,
/// `photo_url`, `relationship_type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct CandidateProfile {
    pub id: ProfileId,
    #[serde(rename = "name")]
    pub display_name: String,
    pub age: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bio: String,
    #[serde(rename = "photo_url", default)]
    pub photo_ref: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interests: Vec<String>,
    #[serde(
        rename = "relationship_type",
        default,
        deserialize_with = "null_as_default"
    )]
    pub seeking: SeekingType,
}

// Unset profile columns come back as `null`, not as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CandidateProfile {
    #[must_use]
    pub fn new(id: impl Into<ProfileId>, display_name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            age,
            bio: String::new(),
            photo_ref: None,
            interests: Vec::new(),
            seeking: SeekingType::Unspecified,
        }
    }

    /// Set the bio.
    #[must_use]
    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    /// Set the (blurred until revealed) photo reference.
    #[must_use]
    pub fn with_photo(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = Some(photo_ref.into());
        self
    }

    /// Set the interests, in display order.
    #[must_use]
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    /// Set the relationship type.
    #[must_use]
    pub fn with_seeking(mut self, seeking: SeekingType) -> Self {
        self.seeking = seeking;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_profile_row() {
        let json = r#"{
            "id": "1",
            "name": "Sarah",
            "age": 28,
            "bio": "Adventure seeker, coffee lover, and dog mom.",
            "photo_url": "https://images.example.com/774909.jpeg",
            "interests": ["Travel", "Coffee", "Hiking"],
            "relationship_type": "serious",
            "created_at": "2024-01-01",
            "updated_at": "2024-01-01"
        }"#;

        let profile: CandidateProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile.id, ProfileId::from("1"));
        assert_eq!(profile.display_name, "Sarah");
        assert_eq!(profile.interests, ["Travel", "Coffee", "Hiking"]);
        assert_eq!(profile.seeking, SeekingType::Serious);
        assert!(profile.photo_ref.is_some());
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"{ "id": "2", "name": "Alex", "age": 32 }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile, CandidateProfile::new("2", "Alex", 32));
    }

    #[test]
    fn null_columns_default() {
        let json = r#"{
            "id": "5",
            "name": "Kim",
            "age": 29,
            "bio": null,
            "photo_url": null,
            "interests": null,
            "relationship_type": null
        }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();

        assert_eq!(profile, CandidateProfile::new("5", "Kim", 29));
    }

    #[test]
    fn unknown_relationship_type_is_unspecified() {
        let json = r#"{ "id": "3", "name": "Maya", "age": 26, "relationship_type": "friends" }"#;
        let profile: CandidateProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.seeking, SeekingType::Unspecified);
    }

    #[test]
    fn serializes_with_backend_names() {
        let profile = CandidateProfile::new("4", "Sam", 30)
            .with_photo("p.jpg")
            .with_seeking(SeekingType::Casual);
        let value = serde_json::to_value(&profile).unwrap();

        assert_eq!(value["name"], "Sam");
        assert_eq!(value["photo_url"], "p.jpg");
        assert_eq!(value["relationship_type"], "casual");
    }
}
